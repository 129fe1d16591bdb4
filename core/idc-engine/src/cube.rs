//! FILENAME: core/idc-engine/src/cube.rs
//! Iterative Data Cube - composes one technique per axis over a dense cube.
//!
//! Algorithm:
//! 1. Construct: copy the raw cube, then for each axis in order rewrite every
//!    fiber along that axis with the axis technique. Each axis works on the
//!    output of all earlier axes.
//! 2. Query: take each axis's beta map for its range and sum, over the
//!    Cartesian product of the maps, the product of coefficients times the
//!    transformed value at that coordinate.
//! 3. Update: write the delta into the raw cube, then add the delta times the
//!    product of coefficients at every coordinate of the Cartesian product of
//!    the per-axis alpha maps.
//!
//! The transformed cube has exactly as many slots as the raw cube.

use std::cell::Cell;
use std::time::Instant;

use once_cell::unsync::OnceCell;
use serde::Serialize;
use smallvec::SmallVec;

use crate::coefficients::CoefficientMap;
use crate::definition::{CostPair, CubeDefinition, TechniqueKind};
use crate::error::{IdcError, Result};
use crate::shape::{for_each_tuple, CubeShape, DenseCube};
use crate::technique::{AxisTechnique, BoundTechnique};

// ============================================================================
// REPORTING TYPES
// ============================================================================

/// Read-only snapshot of a cube's configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeInfo {
    pub shape: Vec<usize>,
    /// Technique identifier per axis.
    pub techniques: Vec<String>,
    pub theoretical_costs: CostPair,
    pub constructed: bool,
}

/// Operation counters. `cells_read` and `cells_written` count transformed
/// cells touched by queries and updates, i.e. the realized costs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CubeStats {
    pub queries: u64,
    pub updates: u64,
    pub rebuilds: u64,
    pub cells_read: u64,
    pub cells_written: u64,
}

/// Per-axis beta maps for one range query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub axis_maps: Vec<CoefficientMap>,
}

impl QueryPlan {
    /// Number of transformed cells the query reads.
    pub fn cost(&self) -> u64 {
        self.axis_maps.iter().map(|m| m.len() as u64).product()
    }
}

// ============================================================================
// ITERATIVE DATA CUBE
// ============================================================================

/// Owns the raw cube, the per-axis technique binding and, once constructed,
/// the transformed cube.
#[derive(Debug)]
pub struct IterativeDataCube {
    original: DenseCube,
    techniques: Vec<TechniqueKind>,
    bindings: Vec<BoundTechnique>,
    transformed: OnceCell<Vec<f64>>,
    stats: Cell<CubeStats>,
}

impl IterativeDataCube {
    /// Binds one technique per axis. The technique count must equal the axis
    /// count; nothing is padded or truncated.
    pub fn new(original: DenseCube, techniques: Vec<TechniqueKind>) -> Result<Self> {
        let shape = original.shape();
        if techniques.len() != shape.ndim() {
            return Err(IdcError::Configuration(format!(
                "cube has {} axes but {} techniques were given",
                shape.ndim(),
                techniques.len()
            )));
        }

        let bindings = techniques
            .iter()
            .enumerate()
            .map(|(axis, technique)| technique.bind(shape.axis_len(axis)))
            .collect::<Result<Vec<_>>>()?;

        Ok(IterativeDataCube {
            original,
            techniques,
            bindings,
            transformed: OnceCell::new(),
            stats: Cell::new(CubeStats::default()),
        })
    }

    /// Builds a cube from a definition and row-major data.
    pub fn from_definition(definition: &CubeDefinition, data: Vec<f64>) -> Result<Self> {
        definition.validate()?;
        let original = DenseCube::from_vec(&definition.shape, data)?;
        Self::new(original, definition.techniques.clone())
    }

    pub fn shape(&self) -> &CubeShape {
        self.original.shape()
    }

    pub fn techniques(&self) -> &[TechniqueKind] {
        &self.techniques
    }

    /// The raw cube, including every applied update.
    pub fn original(&self) -> &DenseCube {
        &self.original
    }

    pub fn is_constructed(&self) -> bool {
        self.transformed.get().is_some()
    }

    pub fn stats(&self) -> CubeStats {
        self.stats.get()
    }

    fn record(&self, f: impl FnOnce(&mut CubeStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    // ------------------------------------------------------------------------
    // CONSTRUCTION
    // ------------------------------------------------------------------------

    /// Separable transform of the raw cube, one axis at a time in order.
    fn build_transformed(&self) -> Vec<f64> {
        let started = Instant::now();
        let shape = self.original.shape();
        let mut cube = self.original.data().to_vec();

        for (axis, technique) in self.bindings.iter().enumerate() {
            let len = shape.axis_len(axis);
            let stride = shape.stride(axis);
            let mut fiber = vec![0.0; len];

            for start in shape.fiber_starts(axis) {
                for (k, slot) in fiber.iter_mut().enumerate() {
                    *slot = cube[start + k * stride];
                }
                technique.preprocess_in_place(&mut fiber);
                for (k, value) in fiber.iter().enumerate() {
                    cube[start + k * stride] = *value;
                }
            }
        }

        log::info!(
            "construct shape={:?} techniques={} cells={} elapsed_us={}",
            shape.dims(),
            self.label(),
            cube.len(),
            started.elapsed().as_micros()
        );
        cube
    }

    fn transformed(&self) -> &[f64] {
        self.transformed.get_or_init(|| {
            self.record(|s| s.rebuilds += 1);
            self.build_transformed()
        })
    }

    /// Rebuilds the transformed cube from the raw cube, discarding any
    /// accumulated floating-point drift.
    pub fn construct(&mut self) -> &[f64] {
        self.transformed = OnceCell::new();
        self.transformed()
    }

    /// Slots held by the transformed cube. Builds it if needed.
    pub fn transformed_storage_len(&self) -> usize {
        self.transformed().len()
    }

    /// Largest absolute difference between the maintained transformed cube
    /// and a fresh rebuild. Zero when not yet constructed.
    pub fn drift(&self) -> f64 {
        let Some(current) = self.transformed.get() else {
            return 0.0;
        };
        let fresh = self.build_transformed();
        current
            .iter()
            .zip(&fresh)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    // ------------------------------------------------------------------------
    // QUERIES
    // ------------------------------------------------------------------------

    /// Per-axis beta maps for `ranges`, or `None` when some axis has
    /// start > end and the query is empty.
    pub fn query_plan(&self, ranges: &[(usize, usize)]) -> Result<Option<QueryPlan>> {
        let shape = self.original.shape();
        shape.check_arity(ranges.len())?;
        for (axis, &(start, end)) in ranges.iter().enumerate() {
            let len = shape.axis_len(axis);
            if start <= end && end >= len {
                return Err(IdcError::IndexOutOfBounds { axis, index: end, len });
            }
        }
        if ranges.iter().any(|&(start, end)| start > end) {
            return Ok(None);
        }

        let axis_maps = self
            .bindings
            .iter()
            .zip(ranges)
            .map(|(technique, &(start, end))| technique.beta(start, end))
            .collect();
        Ok(Some(QueryPlan { axis_maps }))
    }

    /// Sum of the raw cube over the inclusive hyper-rectangle `ranges`.
    /// An axis with start > end makes the whole sum 0.
    pub fn range_query(&self, ranges: &[(usize, usize)]) -> Result<f64> {
        let Some(plan) = self.query_plan(ranges)? else {
            log::debug!("range_query ranges={:?} empty", ranges);
            self.record(|s| s.queries += 1);
            return Ok(0.0);
        };

        let transformed = self.transformed();
        let mut sum = 0.0;
        for_each_term(self.original.shape(), &plan.axis_maps, |offset, coefficient| {
            sum += coefficient * transformed[offset];
        });

        let cost = plan.cost();
        self.record(|s| {
            s.queries += 1;
            s.cells_read += cost;
        });
        log::debug!("range_query ranges={:?} cells={} sum={}", ranges, cost, sum);
        Ok(sum)
    }

    // ------------------------------------------------------------------------
    // UPDATES
    // ------------------------------------------------------------------------

    /// Adds `delta` to the raw cell at `indices` and patches the transformed
    /// cube. On error nothing is modified.
    pub fn update_cell(&mut self, indices: &[usize], delta: f64) -> Result<()> {
        let offset = self.original.shape().check_indices(indices)?;

        // Build before touching the raw cube so the delta is not counted twice.
        let mut transformed = match self.transformed.take() {
            Some(cube) => cube,
            None => {
                self.record(|s| s.rebuilds += 1);
                self.build_transformed()
            }
        };

        let axis_maps: SmallVec<[CoefficientMap; 4]> = self
            .bindings
            .iter()
            .zip(indices)
            .map(|(technique, &index)| technique.alpha(index))
            .collect();

        let mut written = 0u64;
        for_each_term(self.original.shape(), &axis_maps, |position, coefficient| {
            transformed[position] += coefficient * delta;
            written += 1;
        });

        self.original.add_at_offset(offset, delta);
        self.transformed = OnceCell::from(transformed);
        self.record(|s| {
            s.updates += 1;
            s.cells_written += written;
        });
        log::debug!("update_cell indices={:?} delta={} cells={}", indices, delta, written);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // COSTS & INFO
    // ------------------------------------------------------------------------

    /// Product over axes of each technique's declared cost.
    pub fn theoretical_costs(&self) -> CostPair {
        self.bindings
            .iter()
            .fold(CostPair::UNIT, |acc, technique| acc.combine(technique.cost()))
    }

    pub fn get_cube_info(&self) -> CubeInfo {
        CubeInfo {
            shape: self.original.shape().dims().to_vec(),
            techniques: self
                .techniques
                .iter()
                .map(|t| t.identifier().to_string())
                .collect(),
            theoretical_costs: self.theoretical_costs(),
            constructed: self.is_constructed(),
        }
    }

    /// Label such as "PS-SRPS-SDDC".
    pub fn label(&self) -> String {
        self.techniques
            .iter()
            .map(|t| t.short_name())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Visits every coordinate of the Cartesian product of the per-axis maps with
/// its flat offset and the product of its coefficients.
fn for_each_term(shape: &CubeShape, axis_maps: &[CoefficientMap], mut visit: impl FnMut(usize, f64)) {
    let entries: SmallVec<[SmallVec<[(usize, f64); 4]>; 4]> = axis_maps
        .iter()
        .map(|map| map.iter().collect())
        .collect();
    let extents: SmallVec<[usize; 4]> = entries.iter().map(|e| e.len()).collect();

    for_each_tuple(&extents, |tuple| {
        let mut offset = 0;
        let mut coefficient = 1.0;
        for (axis, &k) in tuple.iter().enumerate() {
            let (position, c) = entries[axis][k];
            offset += position * shape.stride(axis);
            coefficient *= c;
        }
        visit(offset, coefficient);
    });
}
