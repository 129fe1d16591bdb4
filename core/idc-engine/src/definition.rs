//! FILENAME: core/idc-engine/src/definition.rs
//! Cube Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE an Iterative Data Cube:
//! which one-dimensional technique is bound to each axis, and the static
//! cost model that follows from that choice. These structures are:
//! - Serializable (for experiment configs and reports)
//! - Independent of cube data
//! - Immutable snapshots of the caller's intent

use serde::{Deserialize, Serialize};

use crate::error::{IdcError, Result};
use crate::technique::{
    BinaryTreeTechnique, BoundTechnique, CustomBlockTechnique, IdentityTechnique,
    PrefixSumTechnique, SquareRootBlockTechnique,
};

// ============================================================================
// COST MODEL
// ============================================================================

/// Declared (query, update) cost of a configuration.
///
/// Costs are closed-form properties of the technique and axis length. They
/// never depend on the data held by the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostPair {
    pub query: u64,
    pub update: u64,
}

impl CostPair {
    /// Neutral element for combining per-axis costs.
    pub const UNIT: CostPair = CostPair { query: 1, update: 1 };

    pub fn new(query: u64, update: u64) -> Self {
        CostPair { query, update }
    }

    /// Combines the costs of two independent axes.
    ///
    /// Queries and updates walk the Cartesian product of the per-axis
    /// coefficient maps, so axis costs multiply.
    pub fn combine(self, other: CostPair) -> CostPair {
        CostPair {
            query: self.query.saturating_mul(other.query),
            update: self.update.saturating_mul(other.update),
        }
    }

    /// query / update, used to compare how a configuration balances the two.
    pub fn ratio(&self) -> f64 {
        if self.update == 0 {
            return f64::INFINITY;
        }
        self.query as f64 / self.update as f64
    }
}

impl From<CostPair> for (u64, u64) {
    fn from(cost: CostPair) -> Self {
        (cost.query, cost.update)
    }
}

/// ceil(log2(n)), with log2 of 0 and 1 taken as 0.
pub(crate) fn ceil_log2(n: usize) -> u64 {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as u64
    }
}

// ============================================================================
// TECHNIQUES
// ============================================================================

/// The one-dimensional pre-aggregation technique applied along one axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TechniqueKind {
    /// No pre-aggregation. Baseline.
    Identity,
    /// Running cumulative sum.
    PrefixSum,
    /// Fixed-size blocks holding local prefixes, with a global running
    /// total at each block's last position.
    SquareRootBlock { block_size: usize },
    /// Balanced binary partition with subtree sums folded into the fiber.
    BinaryTreeHierarchical,
    /// Caller-chosen blocks holding local prefixes only.
    CustomBlockPartition { block_sizes: Vec<usize> },
}

impl TechniqueKind {
    /// Stable identifier used in cube info and reports.
    pub fn identifier(&self) -> &'static str {
        match self {
            TechniqueKind::Identity => "Identity",
            TechniqueKind::PrefixSum => "PrefixSum",
            TechniqueKind::SquareRootBlock { .. } => "SquareRootBlock",
            TechniqueKind::BinaryTreeHierarchical => "BinaryTreeHierarchical",
            TechniqueKind::CustomBlockPartition { .. } => "CustomBlockPartition",
        }
    }

    /// Short label as used in the data cube literature (PS, SRPS, SDDC, LPS).
    pub fn short_name(&self) -> &'static str {
        match self {
            TechniqueKind::Identity => "NONE",
            TechniqueKind::PrefixSum => "PS",
            TechniqueKind::SquareRootBlock { .. } => "SRPS",
            TechniqueKind::BinaryTreeHierarchical => "SDDC",
            TechniqueKind::CustomBlockPartition { .. } => "LPS",
        }
    }

    /// Checks the technique parameters, independent of any axis length.
    pub fn validate(&self) -> Result<()> {
        match self {
            TechniqueKind::SquareRootBlock { block_size } if *block_size == 0 => Err(
                IdcError::Configuration("SquareRootBlock block_size must be at least 1".to_string()),
            ),
            TechniqueKind::CustomBlockPartition { block_sizes } => {
                if block_sizes.is_empty() {
                    return Err(IdcError::Configuration(
                        "CustomBlockPartition needs at least one block".to_string(),
                    ));
                }
                if let Some(pos) = block_sizes.iter().position(|&size| size == 0) {
                    return Err(IdcError::Configuration(format!(
                        "CustomBlockPartition block {} has size 0",
                        pos
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Declared cost of this technique on an axis of length `len`.
    pub fn cost(&self, len: usize) -> CostPair {
        let n = len as u64;
        match self {
            TechniqueKind::Identity => CostPair::new(n, 1),
            TechniqueKind::PrefixSum => CostPair::new(2, n),
            TechniqueKind::SquareRootBlock { block_size } => {
                CostPair::new(4, len.div_ceil((*block_size).max(1)) as u64)
            }
            TechniqueKind::BinaryTreeHierarchical => {
                // A single-cell axis still needs one coefficient.
                let height = ceil_log2(len).max(1);
                CostPair::new(height, height)
            }
            TechniqueKind::CustomBlockPartition { block_sizes } => {
                let blocks = crate::technique::custom_block::block_starts(block_sizes, len).len() as u64;
                CostPair::new(blocks, blocks)
            }
        }
    }

    /// Derives the immutable per-axis layout for an axis of length `len`.
    ///
    /// The returned value is only valid for fibers of exactly `len` cells.
    pub fn bind(&self, len: usize) -> Result<BoundTechnique> {
        self.validate()?;
        if len == 0 {
            return Err(IdcError::Configuration(format!(
                "cannot bind {} to an empty axis",
                self.identifier()
            )));
        }

        let bound = match self {
            TechniqueKind::Identity => BoundTechnique::Identity(IdentityTechnique::new(len)),
            TechniqueKind::PrefixSum => BoundTechnique::PrefixSum(PrefixSumTechnique::new(len)),
            TechniqueKind::SquareRootBlock { block_size } => {
                BoundTechnique::SquareRootBlock(SquareRootBlockTechnique::new(len, *block_size))
            }
            TechniqueKind::BinaryTreeHierarchical => {
                BoundTechnique::BinaryTree(BinaryTreeTechnique::new(len))
            }
            TechniqueKind::CustomBlockPartition { block_sizes } => {
                BoundTechnique::CustomBlocks(CustomBlockTechnique::new(len, block_sizes))
            }
        };
        Ok(bound)
    }

    /// Square-root heuristic for a custom partition: blocks of floor(sqrt(n))
    /// cells, enough of them to cover the axis.
    pub fn custom_blocks_for_len(len: usize) -> TechniqueKind {
        let block = ((len as f64).sqrt() as usize).max(1);
        let count = len.div_ceil(block).max(1);
        TechniqueKind::CustomBlockPartition {
            block_sizes: vec![block; count],
        }
    }

    /// Square-root block technique sized for an axis of length `len`.
    pub fn square_root_for_len(len: usize) -> TechniqueKind {
        TechniqueKind::SquareRootBlock {
            block_size: ((len as f64).sqrt() as usize).max(1),
        }
    }
}

impl Default for TechniqueKind {
    fn default() -> Self {
        TechniqueKind::PrefixSum
    }
}

// ============================================================================
// CUBE DEFINITION
// ============================================================================

/// Shape of a cube plus the technique bound to each axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeDefinition {
    /// Axis lengths, outermost first.
    pub shape: Vec<usize>,

    /// One technique per axis, in axis order.
    pub techniques: Vec<TechniqueKind>,
}

impl CubeDefinition {
    pub fn new(shape: Vec<usize>, techniques: Vec<TechniqueKind>) -> Self {
        CubeDefinition { shape, techniques }
    }

    /// Binds the same technique to every axis.
    pub fn uniform(shape: Vec<usize>, technique: TechniqueKind) -> Self {
        let techniques = vec![technique; shape.len()];
        CubeDefinition { shape, techniques }
    }

    /// Axis count must match technique count; axes must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.shape.is_empty() {
            return Err(IdcError::Configuration("cube must have at least one axis".to_string()));
        }
        if self.shape.len() != self.techniques.len() {
            return Err(IdcError::Configuration(format!(
                "cube has {} axes but {} techniques were given",
                self.shape.len(),
                self.techniques.len()
            )));
        }
        if let Some(axis) = self.shape.iter().position(|&len| len == 0) {
            return Err(IdcError::Configuration(format!("axis {} has length 0", axis)));
        }
        for technique in &self.techniques {
            technique.validate()?;
        }
        Ok(())
    }

    /// Label such as "PS-SRPS-SDDC".
    pub fn label(&self) -> String {
        self.techniques
            .iter()
            .map(|t| t.short_name())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Product of the per-axis declared costs.
    pub fn theoretical_costs(&self) -> CostPair {
        self.shape
            .iter()
            .zip(&self.techniques)
            .fold(CostPair::UNIT, |acc, (&len, technique)| acc.combine(technique.cost(len)))
    }
}
