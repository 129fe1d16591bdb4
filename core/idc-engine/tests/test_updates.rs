//! FILENAME: tests/test_updates.rs
//! Update propagation: queries after updates match the updated raw cube.

mod common;

use common::{all_techniques, assert_close, build, random_cube, random_index, random_ranges, rng};
use idc_engine::{IdcError, TechniqueKind};
use rand::Rng;

fn contains(ranges: &[(usize, usize)], indices: &[usize]) -> bool {
    ranges
        .iter()
        .zip(indices)
        .all(|(&(start, end), &i)| start <= i && i <= end)
}

#[test]
fn test_update_shifts_only_covering_ranges() {
    let dims = [5, 6];
    let cube = random_cube(&dims, 5);
    let mut rng = rng(17);

    for first in all_techniques() {
        for second in [TechniqueKind::PrefixSum, TechniqueKind::BinaryTreeHierarchical] {
            let mut idc = build(&cube, vec![first.clone(), second.clone()]);
            for _ in 0..20 {
                let ranges = random_ranges(&dims, &mut rng);
                let target = random_index(&dims, &mut rng);
                let delta = rng.gen_range(-5.0..5.0);

                let before = idc.range_query(&ranges).unwrap();
                idc.update_cell(&target, delta).unwrap();
                let after = idc.range_query(&ranges).unwrap();

                let expected = if contains(&ranges, &target) { before + delta } else { before };
                assert_close(after, expected, &format!("{:?} x {:?} {:?} {:?}", first, second, ranges, target));
            }
        }
    }
}

#[test]
fn test_many_updates_match_brute_force() {
    let dims = [4, 5, 3];
    let cube = random_cube(&dims, 8);
    let mut rng = rng(23);

    for technique in all_techniques() {
        let mut idc = build(&cube, vec![technique.clone(), TechniqueKind::PrefixSum, technique.clone()]);
        for _ in 0..50 {
            let target = random_index(&dims, &mut rng);
            idc.update_cell(&target, rng.gen_range(-1.0..1.0)).unwrap();
        }
        for _ in 0..50 {
            let ranges = random_ranges(&dims, &mut rng);
            let expected = idc.original().brute_force_sum(&ranges).unwrap();
            assert_close(idc.range_query(&ranges).unwrap(), expected, &format!("{:?}", technique));
        }
        assert!(idc.drift() < 1e-9, "{:?} drifted {}", technique, idc.drift());
    }
}

#[test]
fn test_rebuild_clears_drift() {
    let dims = [8, 8];
    let cube = random_cube(&dims, 31);
    let mut idc = build(&cube, vec![TechniqueKind::PrefixSum, TechniqueKind::PrefixSum]);
    let mut rng = rng(5);

    for _ in 0..500 {
        let target = random_index(&dims, &mut rng);
        idc.update_cell(&target, rng.gen_range(-1e6..1e6)).unwrap();
    }
    idc.construct();
    assert_eq!(idc.drift(), 0.0);
    assert_close(
        idc.range_query(&[(0, 7), (0, 7)]).unwrap(),
        idc.original().total(),
        "total after rebuild",
    );
}

#[test]
fn test_rejected_update_changes_nothing() {
    let dims = [3, 4];
    let cube = random_cube(&dims, 2);
    let mut idc = build(&cube, vec![TechniqueKind::SquareRootBlock { block_size: 2 }; 2]);
    let before = idc.construct().to_vec();

    assert_eq!(
        idc.update_cell(&[3, 0], 1.0),
        Err(IdcError::IndexOutOfBounds { axis: 0, index: 3, len: 3 })
    );
    assert_eq!(
        idc.update_cell(&[0, 0, 0], 1.0),
        Err(IdcError::DimensionMismatch { expected: 2, actual: 3 })
    );
    assert_eq!(idc.original(), &cube);
    assert_eq!(idc.construct(), before.as_slice());
}
