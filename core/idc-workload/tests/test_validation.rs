//! FILENAME: tests/test_validation.rs
//! The validation suite and the sales workload run end to end.

use idc_engine::{CubeDefinition, IterativeDataCube, TechniqueKind};
use idc_workload::validation::{
    check_dimensional_independence, check_exactness, check_space_optimality,
    check_update_consistency, suite_definitions,
};
use idc_workload::{
    analyst_queries, run_benchmark, run_suite, sales_cube, sales_update_pattern, SalesCubeConfig,
};

fn small_sales() -> SalesCubeConfig {
    SalesCubeConfig {
        regions: 4,
        time_periods: 60,
        products: 12,
        customer_types: 3,
        seed: 21,
    }
}

#[test]
fn test_full_suite_passes() {
    let report = run_suite(42).unwrap();
    let failures: Vec<_> = report.failures().collect();
    assert!(failures.is_empty(), "failed checks: {:?}", failures);
    // Three checks per configuration, then space, variety and independence.
    assert_eq!(report.checks.len(), suite_definitions().len() * 3 + 3);
}

#[test]
fn test_checks_on_uneven_shapes() {
    let definition = CubeDefinition::new(
        vec![1, 7, 13],
        vec![
            TechniqueKind::BinaryTreeHierarchical,
            TechniqueKind::CustomBlockPartition { block_sizes: vec![2, 4] },
            TechniqueKind::SquareRootBlock { block_size: 5 },
        ],
    );
    assert!(check_exactness(&definition, 60, 3).unwrap().passed);
    assert!(check_update_consistency(&definition, 40, 3).unwrap().passed);
    assert!(check_space_optimality(&[definition.clone()], 3).unwrap().passed);
    assert!(
        check_dimensional_independence(&definition, &TechniqueKind::Identity, 3)
            .unwrap()
            .passed
    );
}

#[test]
fn test_analyst_session_on_sales_cube() {
    let config = small_sales();
    let dims = config.dims();
    let data = sales_cube(&config).unwrap();
    let cube = IterativeDataCube::new(
        data.clone(),
        vec![
            TechniqueKind::PrefixSum,
            TechniqueKind::square_root_for_len(dims[1]),
            TechniqueKind::BinaryTreeHierarchical,
            TechniqueKind::Identity,
        ],
    )
    .unwrap();

    for query in analyst_queries(&dims, 200, 8).unwrap() {
        let actual = cube.range_query(&query.ranges).unwrap();
        let expected = data.brute_force_sum(&query.ranges).unwrap();
        assert!(
            (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "{:?} {:?}: {} vs {}",
            query.kind,
            query.ranges,
            actual,
            expected
        );
    }
}

#[test]
fn test_sales_updates_benchmark() {
    let config = small_sales();
    let dims = config.dims();
    let definition = CubeDefinition::new(
        dims.to_vec(),
        vec![
            TechniqueKind::Identity,
            TechniqueKind::custom_blocks_for_len(dims[1]),
            TechniqueKind::PrefixSum,
            TechniqueKind::BinaryTreeHierarchical,
        ],
    );
    let queries: Vec<_> = analyst_queries(&dims, 50, 2)
        .unwrap()
        .into_iter()
        .map(|q| q.ranges)
        .collect();
    let updates = sales_update_pattern(&dims, 2).unwrap();

    let record = run_benchmark(&definition, sales_cube(&config).unwrap(), &queries, &updates).unwrap();
    assert_eq!(record.label, "NONE-LPS-PS-SDDC");
    assert_eq!(record.queries, 50);
    assert_eq!(record.updates, 80);
    assert_eq!(record.theoretical_costs, definition.theoretical_costs());
    // Transformed values reach the millions here; allow for rounding.
    assert!(record.drift <= 1e-6);
}
