//! FILENAME: tests/common/mod.rs
//! Fixtures for Iterative Data Cube integration tests.

#![allow(dead_code)]

use idc_engine::{DenseCube, IterativeDataCube, TechniqueKind};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub const TOLERANCE: f64 = 1e-9;

/// Every technique, with block parameters that exercise partial blocks.
pub fn all_techniques() -> Vec<TechniqueKind> {
    vec![
        TechniqueKind::Identity,
        TechniqueKind::PrefixSum,
        TechniqueKind::SquareRootBlock { block_size: 2 },
        TechniqueKind::SquareRootBlock { block_size: 3 },
        TechniqueKind::BinaryTreeHierarchical,
        TechniqueKind::CustomBlockPartition { block_sizes: vec![2, 3] },
        TechniqueKind::CustomBlockPartition { block_sizes: vec![1, 1, 4] },
    ]
}

/// Seeded random cube with values in [0, 10).
pub fn random_cube(dims: &[usize], seed: u64) -> DenseCube {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    DenseCube::from_fn(dims, |_| rng.gen::<f64>() * 10.0).unwrap()
}

/// Seeded random inclusive range per axis.
pub fn random_ranges(dims: &[usize], rng: &mut impl Rng) -> Vec<(usize, usize)> {
    dims.iter()
        .map(|&len| {
            let start = rng.gen_range(0..len);
            let end = rng.gen_range(start..len);
            (start, end)
        })
        .collect()
}

pub fn random_index(dims: &[usize], rng: &mut impl Rng) -> Vec<usize> {
    dims.iter().map(|&len| rng.gen_range(0..len)).collect()
}

pub fn rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

pub fn build(cube: &DenseCube, techniques: Vec<TechniqueKind>) -> IterativeDataCube {
    IterativeDataCube::new(cube.clone(), techniques).unwrap()
}

pub fn assert_close(actual: f64, expected: f64, context: &str) {
    assert!(
        (actual - expected).abs() < TOLERANCE * expected.abs().max(1.0),
        "{}: {} != {}",
        context,
        actual,
        expected
    );
}

/// Every inclusive range on an axis of `len` cells, plus one reversed range.
pub fn all_ranges(len: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for start in 0..len {
        for end in start..len {
            ranges.push((start, end));
        }
    }
    if len > 1 {
        ranges.push((1, 0));
    }
    ranges
}
