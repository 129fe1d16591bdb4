//! FILENAME: core/idc-workload/src/validation.rs
//! PURPOSE: Checks that a set of cube configurations behaves as the cost
//! model and the exactness guarantee promise.
//! CONTEXT: Every check builds its own cubes through the public engine API
//! and returns a `CheckOutcome` instead of panicking, so a report can list
//! every failure at once.

use serde::Serialize;

use idc_engine::{CostPair, CubeDefinition, IterativeDataCube, TechniqueKind};

use crate::error::Result;
use crate::generator::uniform_cube;
use crate::workload::{random_queries, random_updates, RangeQuery};

/// Accepted error relative to the magnitude of the exact sum.
pub const TOLERANCE: f64 = 1e-9;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= TOLERANCE * expected.abs().max(1.0)
}

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn new(name: &str, passed: bool, detail: String) -> Self {
        log::info!("check name={} passed={} {}", name, passed, detail);
        CheckOutcome {
            name: name.to_string(),
            passed,
            detail,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckOutcome>,
}

impl ValidationReport {
    pub fn push(&mut self, outcome: CheckOutcome) {
        self.checks.push(outcome);
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// "passed/total" line for logs.
    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!("{}/{} checks passed", passed, self.checks.len())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// COST TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub technique: String,
    pub len: usize,
    pub costs: CostPair,
}

/// The one-dimensional techniques compared in the cost table.
pub fn reference_techniques() -> Vec<TechniqueKind> {
    vec![
        TechniqueKind::Identity,
        TechniqueKind::PrefixSum,
        TechniqueKind::SquareRootBlock { block_size: 3 },
        TechniqueKind::BinaryTreeHierarchical,
        TechniqueKind::CustomBlockPartition {
            block_sizes: vec![5, 5],
        },
    ]
}

/// Declared (query, update) cost of every reference technique at each length.
pub fn technique_cost_table(lens: &[usize]) -> Vec<CostRow> {
    reference_techniques()
        .iter()
        .flat_map(|technique| {
            lens.iter().map(move |&len| CostRow {
                technique: technique.short_name().to_string(),
                len,
                costs: technique.cost(len),
            })
        })
        .collect()
}

// ============================================================================
// CHECKS
// ============================================================================

fn build(definition: &CubeDefinition, seed: u64) -> Result<IterativeDataCube> {
    definition.validate()?;
    let data = uniform_cube(&definition.shape, seed)?;
    Ok(IterativeDataCube::new(data, definition.techniques.clone())?)
}

/// Random queries plus the whole cube.
fn query_set(shape: &[usize], count: usize, seed: u64) -> Result<Vec<RangeQuery>> {
    let mut queries = random_queries(shape, count, seed)?;
    queries.push(shape.iter().map(|&len| (0, len - 1)).collect());
    Ok(queries)
}

/// Counts queries whose answer differs from the brute-force sum.
fn count_mismatches(cube: &IterativeDataCube, queries: &[RangeQuery]) -> Result<(usize, f64)> {
    let mut mismatches = 0;
    let mut worst = 0.0f64;
    for ranges in queries {
        let actual = cube.range_query(ranges)?;
        let expected = cube.original().brute_force_sum(ranges)?;
        worst = worst.max((actual - expected).abs());
        if !close(actual, expected) {
            mismatches += 1;
        }
    }
    Ok((mismatches, worst))
}

/// Every query matches the brute-force sum of the raw cube.
pub fn check_exactness(definition: &CubeDefinition, queries: usize, seed: u64) -> Result<CheckOutcome> {
    let mut cube = build(definition, seed)?;
    cube.construct();
    let queries = query_set(&definition.shape, queries, seed.wrapping_add(1))?;
    let (mismatches, worst) = count_mismatches(&cube, &queries)?;
    Ok(CheckOutcome::new(
        &format!("exactness[{}]", definition.label()),
        mismatches == 0,
        format!("{} of {} queries off, worst error {:e}", mismatches, queries.len(), worst),
    ))
}

/// After a run of updates, queries still match brute force over the updated
/// raw cube and the maintained transformed cube equals a rebuild.
pub fn check_update_consistency(
    definition: &CubeDefinition,
    updates: usize,
    seed: u64,
) -> Result<CheckOutcome> {
    let mut cube = build(definition, seed)?;
    cube.construct();
    for update in random_updates(&definition.shape, updates, seed.wrapping_add(2))? {
        cube.update_cell(&update.indices, update.delta)?;
    }

    let queries = query_set(&definition.shape, 50, seed.wrapping_add(3))?;
    let (mismatches, worst) = count_mismatches(&cube, &queries)?;
    let drift = cube.drift();
    Ok(CheckOutcome::new(
        &format!("update_consistency[{}]", definition.label()),
        mismatches == 0 && drift <= TOLERANCE,
        format!(
            "{} updates, {} of {} queries off (worst {:e}), drift {:e}",
            updates,
            mismatches,
            queries.len(),
            worst,
            drift
        ),
    ))
}

/// Each transformed cube holds exactly as many values as its raw cube.
pub fn check_space_optimality(definitions: &[CubeDefinition], seed: u64) -> Result<CheckOutcome> {
    let mut offenders = Vec::new();
    for definition in definitions {
        let cube = build(definition, seed)?;
        let raw = cube.original().storage_len();
        let transformed = cube.transformed_storage_len();
        if transformed != raw {
            offenders.push(format!("{} ({} vs {})", definition.label(), transformed, raw));
        }
    }
    let detail = if offenders.is_empty() {
        format!("{} configurations without overhead", definitions.len())
    } else {
        format!("overhead in {}", offenders.join(", "))
    };
    Ok(CheckOutcome::new("space_optimality", offenders.is_empty(), detail))
}

/// Configurations over one shape reach more than one query/update balance.
pub fn check_cost_variety(definitions: &[CubeDefinition]) -> Result<CheckOutcome> {
    let mut pairs: Vec<CostPair> = Vec::new();
    let mut ratios: Vec<f64> = Vec::new();
    for definition in definitions {
        definition.validate()?;
        let costs = definition.theoretical_costs();
        if !pairs.contains(&costs) {
            pairs.push(costs);
        }
        let ratio = costs.ratio();
        if !ratios.iter().any(|r| close(*r, ratio)) {
            ratios.push(ratio);
        }
    }
    Ok(CheckOutcome::new(
        "cost_variety",
        ratios.len() > 1,
        format!(
            "{} configurations, {} distinct cost pairs, {} distinct ratios",
            definitions.len(),
            pairs.len(),
            ratios.len()
        ),
    ))
}

/// Swapping the technique on one axis changes costs but never answers.
pub fn check_dimensional_independence(
    base: &CubeDefinition,
    replacement: &TechniqueKind,
    seed: u64,
) -> Result<CheckOutcome> {
    let base_cube = build(base, seed)?;
    let queries = query_set(&base.shape, 30, seed.wrapping_add(4))?;

    let mut differing = Vec::new();
    for axis in 0..base.shape.len() {
        let mut techniques = base.techniques.clone();
        techniques[axis] = replacement.clone();
        let modified = IterativeDataCube::new(base_cube.original().clone(), techniques)?;

        for ranges in &queries {
            if !close(modified.range_query(ranges)?, base_cube.range_query(ranges)?) {
                differing.push(axis);
                break;
            }
        }
    }
    let detail = if differing.is_empty() {
        format!("{} replaced on each of {} axes", replacement.short_name(), base.shape.len())
    } else {
        format!("answers changed when replacing axes {:?}", differing)
    };
    Ok(CheckOutcome::new(
        &format!("dimensional_independence[{}]", base.label()),
        differing.is_empty(),
        detail,
    ))
}

/// Constructing twice from the same raw cube gives the same transformed cube.
pub fn check_idempotent_reconstruction(definition: &CubeDefinition, seed: u64) -> Result<CheckOutcome> {
    let mut cube = build(definition, seed)?;
    let first = cube.construct().to_vec();
    let second = cube.construct();
    let identical = first.as_slice() == second;
    Ok(CheckOutcome::new(
        &format!("idempotent_reconstruction[{}]", definition.label()),
        identical,
        format!("{} slots compared", first.len()),
    ))
}

// ============================================================================
// SUITE
// ============================================================================

/// Uniform and mixed configurations over a 10x10x10 cube.
pub fn suite_definitions() -> Vec<CubeDefinition> {
    let shape = vec![10, 10, 10];
    let srps = TechniqueKind::SquareRootBlock { block_size: 3 };
    let mut definitions: Vec<CubeDefinition> = [
        TechniqueKind::Identity,
        TechniqueKind::PrefixSum,
        srps.clone(),
        TechniqueKind::BinaryTreeHierarchical,
        TechniqueKind::custom_blocks_for_len(10),
    ]
    .into_iter()
    .map(|technique| CubeDefinition::uniform(shape.clone(), technique))
    .collect();
    definitions.push(CubeDefinition::new(
        shape,
        vec![TechniqueKind::PrefixSum, srps, TechniqueKind::BinaryTreeHierarchical],
    ));
    definitions
}

/// PS, SRPS and SDDC uniformly and in three axis orders on a 20x20x20 cube.
pub fn cost_variety_definitions() -> Vec<CubeDefinition> {
    let shape = vec![20, 20, 20];
    let ps = TechniqueKind::PrefixSum;
    let srps = TechniqueKind::SquareRootBlock { block_size: 3 };
    let sddc = TechniqueKind::BinaryTreeHierarchical;
    vec![
        CubeDefinition::uniform(shape.clone(), ps.clone()),
        CubeDefinition::uniform(shape.clone(), srps.clone()),
        CubeDefinition::uniform(shape.clone(), sddc.clone()),
        CubeDefinition::new(shape.clone(), vec![ps.clone(), srps.clone(), sddc.clone()]),
        CubeDefinition::new(shape.clone(), vec![srps.clone(), ps.clone(), sddc.clone()]),
        CubeDefinition::new(shape, vec![sddc, ps, srps]),
    ]
}

/// Runs every check over the default configurations.
pub fn run_suite(seed: u64) -> Result<ValidationReport> {
    let definitions = suite_definitions();
    let mut report = ValidationReport::default();

    for definition in &definitions {
        report.push(check_exactness(definition, 100, seed)?);
        report.push(check_update_consistency(definition, 50, seed)?);
        report.push(check_idempotent_reconstruction(definition, seed)?);
    }
    report.push(check_space_optimality(&definitions, seed)?);
    report.push(check_cost_variety(&cost_variety_definitions())?);

    let mixed = CubeDefinition::new(
        vec![10, 10, 10],
        vec![
            TechniqueKind::PrefixSum,
            TechniqueKind::SquareRootBlock { block_size: 3 },
            TechniqueKind::BinaryTreeHierarchical,
        ],
    );
    let lps = TechniqueKind::CustomBlockPartition {
        block_sizes: vec![5, 5],
    };
    report.push(check_dimensional_independence(&mixed, &lps, seed)?);

    log::info!("validation {}", report.summary());
    Ok(report)
}
