//! FILENAME: core/idc-workload/src/benchmark.rs
//! Wall-clock benchmark driver.
//!
//! Times construction, a query workload and an update pattern for one cube
//! definition, and puts the declared costs next to the cells actually touched.

use std::time::Instant;

use serde::Serialize;

use idc_engine::{CostPair, CubeDefinition, DenseCube, IterativeDataCube, TechniqueKind};

use crate::error::{Result, WorkloadError};
use crate::generator::uniform_cube;
use crate::workload::{random_queries, RangeQuery, UpdateOp};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRecord {
    /// Short technique names joined by '-', e.g. "PS-SRPS".
    pub label: String,
    pub shape: Vec<usize>,
    pub construct_secs: f64,
    pub queries: usize,
    pub query_secs: f64,
    pub queries_per_second: f64,
    pub updates: usize,
    pub update_secs: f64,
    pub updates_per_second: f64,
    pub theoretical_costs: CostPair,
    /// Mean transformed cells read per non-empty query.
    pub mean_query_cells: f64,
    /// Mean transformed cells written per update.
    pub mean_update_cells: f64,
    /// Largest gap between the maintained and a rebuilt transformed cube.
    pub drift: f64,
}

fn per_second(count: usize, secs: f64) -> f64 {
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn mean(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Builds a cube from `definition` over `data`, then runs `queries` followed
/// by `updates` against it.
pub fn run_benchmark(
    definition: &CubeDefinition,
    data: DenseCube,
    queries: &[RangeQuery],
    updates: &[UpdateOp],
) -> Result<BenchmarkRecord> {
    if data.shape().dims() != definition.shape.as_slice() {
        return Err(WorkloadError::Invalid(format!(
            "data shape {:?} does not match definition shape {:?}",
            data.shape().dims(),
            definition.shape
        )));
    }
    definition.validate()?;
    let mut cube = IterativeDataCube::new(data, definition.techniques.clone())?;

    let started = Instant::now();
    cube.construct();
    let construct_secs = started.elapsed().as_secs_f64();

    let started = Instant::now();
    for ranges in queries {
        cube.range_query(ranges)?;
    }
    let query_secs = started.elapsed().as_secs_f64();
    let after_queries = cube.stats();

    let started = Instant::now();
    for update in updates {
        cube.update_cell(&update.indices, update.delta)?;
    }
    let update_secs = started.elapsed().as_secs_f64();
    let stats = cube.stats();

    let record = BenchmarkRecord {
        label: cube.label(),
        shape: definition.shape.clone(),
        construct_secs,
        queries: queries.len(),
        query_secs,
        queries_per_second: per_second(queries.len(), query_secs),
        updates: updates.len(),
        update_secs,
        updates_per_second: per_second(updates.len(), update_secs),
        theoretical_costs: cube.theoretical_costs(),
        mean_query_cells: mean(after_queries.cells_read, after_queries.queries),
        mean_update_cells: mean(stats.cells_written, stats.updates),
        drift: cube.drift(),
    };

    log::info!(
        "benchmark label={} shape={:?} qps={:.0} ups={:.0} drift={:e}",
        record.label,
        record.shape,
        record.queries_per_second,
        record.updates_per_second,
        record.drift
    );
    Ok(record)
}

// ============================================================================
// SCALING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingRecord {
    pub size: usize,
    pub technique: String,
    pub construct_secs: f64,
    pub query_secs: f64,
    pub theoretical_costs: CostPair,
}

/// The four pre-aggregating techniques sized for an axis of `len` cells.
pub fn scaling_techniques(len: usize) -> Vec<TechniqueKind> {
    vec![
        TechniqueKind::PrefixSum,
        TechniqueKind::square_root_for_len(len),
        TechniqueKind::BinaryTreeHierarchical,
        TechniqueKind::custom_blocks_for_len(len),
    ]
}

/// Square `size x size` cubes, one technique on both axes, timed on
/// construction and a quarter-cube query.
pub fn scaling_analysis(sizes: &[usize], seed: u64) -> Result<Vec<ScalingRecord>> {
    let mut records = Vec::with_capacity(sizes.len() * 4);
    for &size in sizes {
        let data = uniform_cube(&[size, size], seed)?;
        for technique in scaling_techniques(size) {
            let mut cube = IterativeDataCube::new(data.clone(), vec![technique.clone(); 2])?;

            let started = Instant::now();
            cube.construct();
            let construct_secs = started.elapsed().as_secs_f64();

            let half = size / 2;
            let started = Instant::now();
            cube.range_query(&[(0, half), (0, half)])?;
            let query_secs = started.elapsed().as_secs_f64();

            records.push(ScalingRecord {
                size,
                technique: technique.short_name().to_string(),
                construct_secs,
                query_secs,
                theoretical_costs: cube.theoretical_costs(),
            });
        }
        log::info!("scaling size={} done", size);
    }
    Ok(records)
}

/// Benchmarks `definition` on a seeded uniform cube with `query_count`
/// random queries and the given updates.
pub fn benchmark_definition(
    definition: &CubeDefinition,
    query_count: usize,
    updates: &[UpdateOp],
    seed: u64,
) -> Result<BenchmarkRecord> {
    let data = uniform_cube(&definition.shape, seed)?;
    let queries = random_queries(&definition.shape, query_count, seed.wrapping_add(1))?;
    run_benchmark(definition, data, &queries, updates)
}

/// Pretty JSON report.
pub fn to_json<T: Serialize>(records: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::random_updates;

    #[test]
    fn test_benchmark_counts_and_costs() {
        let definition = CubeDefinition::new(
            vec![6, 9],
            vec![TechniqueKind::PrefixSum, TechniqueKind::BinaryTreeHierarchical],
        );
        let updates = random_updates(&definition.shape, 25, 3).unwrap();
        let record = benchmark_definition(&definition, 40, &updates, 7).unwrap();

        assert_eq!(record.label, "PS-SDDC");
        assert_eq!(record.queries, 40);
        assert_eq!(record.updates, 25);
        assert_eq!(record.theoretical_costs, CostPair::new(2 * 4, 6 * 4));
        assert!(record.mean_query_cells >= 1.0);
        assert!(record.mean_update_cells >= 1.0);
        assert!(record.drift < 1e-9);
    }

    #[test]
    fn test_identity_reads_every_cell() {
        let definition = CubeDefinition::uniform(vec![5, 5], TechniqueKind::Identity);
        let data = uniform_cube(&[5, 5], 1).unwrap();
        let queries = vec![vec![(0, 4), (0, 4)]];
        let record = run_benchmark(&definition, data, &queries, &[]).unwrap();
        assert_eq!(record.mean_query_cells, 25.0);
        assert_eq!(record.mean_update_cells, 0.0);
        assert_eq!(record.updates_per_second, 0.0);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let definition = CubeDefinition::uniform(vec![4, 4], TechniqueKind::PrefixSum);
        let data = uniform_cube(&[4, 5], 1).unwrap();
        assert!(matches!(
            run_benchmark(&definition, data, &[], &[]),
            Err(WorkloadError::Invalid(_))
        ));
    }

    #[test]
    fn test_scaling_analysis_covers_every_technique() {
        let records = scaling_analysis(&[4, 9], 5).unwrap();
        assert_eq!(records.len(), 8);
        let names: Vec<_> = records[..4].iter().map(|r| r.technique.as_str()).collect();
        assert_eq!(names, vec!["PS", "SRPS", "SDDC", "LPS"]);
        assert_eq!(records[4].theoretical_costs, CostPair::new(4, 81));
    }

    #[test]
    fn test_json_report() {
        let records = scaling_analysis(&[4], 2).unwrap();
        let json = to_json(&records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
        assert_eq!(value[0]["technique"], "PS");
        assert_eq!(value[0]["theoreticalCosts"]["query"], 4);
    }
}
