//! FILENAME: core/idc-workload/src/workload.rs
//! Seeded query and update workloads.
//!
//! Every generated range satisfies `start <= end < len` and every update index
//! lies inside its axis, so a workload can be replayed against any cube of
//! the same shape.

use rand::distributions::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkloadError};

/// Inclusive `(start, end)` per axis.
pub type RangeQuery = Vec<(usize, usize)>;

fn check_dims(dims: &[usize]) -> Result<()> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(WorkloadError::Invalid(format!(
            "workload needs non-empty axes, got {:?}",
            dims
        )));
    }
    Ok(())
}

/// Uniform draw from `lo..hi`, or `lo` when the interval is empty.
fn pick(rng: &mut Xoshiro256PlusPlus, lo: usize, hi: usize) -> usize {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Clamps a drawn range onto an axis of length `len`.
fn clamp_range(start: usize, end: usize, len: usize) -> (usize, usize) {
    let start = start.min(len - 1);
    (start, end.clamp(start, len - 1))
}

/// Ranges drawn uniformly: start anywhere, end anywhere at or after start.
pub fn random_queries(dims: &[usize], count: usize, seed: u64) -> Result<Vec<RangeQuery>> {
    check_dims(dims)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Ok((0..count)
        .map(|_| {
            dims.iter()
                .map(|&len| {
                    let start = rng.gen_range(0..len);
                    (start, rng.gen_range(start..len))
                })
                .collect()
        })
        .collect())
}

// ============================================================================
// ANALYST QUERIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Leading slice of every axis, up to about half of it.
    Hierarchical,
    /// First axis spans from its lower half into its upper half.
    Comparison,
    /// A window of one sixth to one third of each axis.
    DrillDown,
    /// Short slices of at most a quarter of each axis.
    SliceDice,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        QueryKind::Hierarchical,
        QueryKind::Comparison,
        QueryKind::DrillDown,
        QueryKind::SliceDice,
    ];

    /// Relative frequency in an analyst session.
    pub fn weight(&self) -> f64 {
        match self {
            QueryKind::Hierarchical => 0.4,
            QueryKind::Comparison => 0.3,
            QueryKind::DrillDown => 0.2,
            QueryKind::SliceDice => 0.1,
        }
    }

    fn ranges(&self, rng: &mut Xoshiro256PlusPlus, dims: &[usize]) -> RangeQuery {
        dims.iter()
            .enumerate()
            .map(|(axis, &len)| {
                let (start, end) = match self {
                    QueryKind::Hierarchical => (0, pick(rng, len / 4, len / 2)),
                    QueryKind::Comparison if axis == 0 => {
                        let low = pick(rng, 0, len / 2);
                        (low, pick(rng, len / 2, len))
                    }
                    QueryKind::Comparison => {
                        let start = pick(rng, 0, len / 2);
                        (start, pick(rng, start, len))
                    }
                    QueryKind::DrillDown => {
                        let start = pick(rng, 0, len / 3);
                        (start, pick(rng, start + len / 6, start + len / 3))
                    }
                    QueryKind::SliceDice => {
                        let start = pick(rng, 0, len);
                        (start, pick(rng, start, (start + len / 4).min(len)))
                    }
                };
                clamp_range(start, end, len)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystQuery {
    pub kind: QueryKind,
    pub ranges: RangeQuery,
}

/// OLAP-style session mixing the four query kinds by their weights.
pub fn analyst_queries(dims: &[usize], count: usize, seed: u64) -> Result<Vec<AnalystQuery>> {
    check_dims(dims)?;
    let chooser = WeightedIndex::new(QueryKind::ALL.iter().map(QueryKind::weight))
        .map_err(|e| WorkloadError::Invalid(format!("query weights: {}", e)))?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    Ok((0..count)
        .map(|_| {
            let kind = QueryKind::ALL[chooser.sample(&mut rng)];
            AnalystQuery {
                kind,
                ranges: kind.ranges(&mut rng, dims),
            }
        })
        .collect())
}

// ============================================================================
// UPDATES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Random,
    /// End-of-day sales report, always positive.
    Batch,
    /// Small real-time transaction.
    Streaming,
    /// Adjustment to historical data, either sign.
    Correction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOp {
    pub kind: UpdateKind,
    pub indices: Vec<usize>,
    pub delta: f64,
}

fn random_indices(rng: &mut Xoshiro256PlusPlus, dims: &[usize]) -> Vec<usize> {
    dims.iter().map(|&len| rng.gen_range(0..len)).collect()
}

/// Updates at uniform cells with deltas in [-1, 1).
pub fn random_updates(dims: &[usize], count: usize, seed: u64) -> Result<Vec<UpdateOp>> {
    check_dims(dims)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Ok((0..count)
        .map(|_| UpdateOp {
            kind: UpdateKind::Random,
            indices: random_indices(&mut rng, dims),
            delta: rng.gen_range(-1.0..1.0),
        })
        .collect())
}

/// A day of sales traffic: 50 batch reports, 20 streaming transactions and
/// 10 corrections, in that order.
pub fn sales_update_pattern(dims: &[usize], seed: u64) -> Result<Vec<UpdateOp>> {
    check_dims(dims)?;
    let invalid = |e: rand_distr::NormalError| WorkloadError::Invalid(format!("update distribution: {}", e));
    let batch = Exp::new(1.0 / 50.0)
        .map_err(|e| WorkloadError::Invalid(format!("update distribution: {}", e)))?;
    let streaming = Normal::new(10.0, 5.0).map_err(invalid)?;
    let correction = Normal::new(0.0, 20.0).map_err(invalid)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let mut updates = Vec::with_capacity(80);
    for _ in 0..50 {
        let indices = random_indices(&mut rng, dims);
        updates.push(UpdateOp {
            kind: UpdateKind::Batch,
            indices,
            delta: batch.sample(&mut rng),
        });
    }
    for (kind, distribution, count) in [
        (UpdateKind::Streaming, streaming, 20),
        (UpdateKind::Correction, correction, 10),
    ] {
        for _ in 0..count {
            let indices = random_indices(&mut rng, dims);
            updates.push(UpdateOp {
                kind,
                indices,
                delta: distribution.sample(&mut rng),
            });
        }
    }
    Ok(updates)
}
