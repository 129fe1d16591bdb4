//! FILENAME: core/idc-engine/src/technique/mod.rs
//! One-dimensional pre-aggregation techniques.
//!
//! A technique is configured by a `TechniqueKind` and bound to an axis length
//! with `TechniqueKind::bind`, which derives its layout (block boundaries,
//! tree height) once. The bound value is immutable and can be shared by every
//! fiber along axes of that length.
//!
//! Every technique keeps the fiber length unchanged: the transformed fiber
//! occupies exactly the slots of the raw one.

pub mod binary_tree;
pub mod custom_block;
pub mod identity;
pub mod prefix_sum;
pub mod square_root;

pub use binary_tree::BinaryTreeTechnique;
pub use custom_block::CustomBlockTechnique;
pub use identity::IdentityTechnique;
pub use prefix_sum::PrefixSumTechnique;
pub use square_root::SquareRootBlockTechnique;

use crate::coefficients::CoefficientMap;
use crate::definition::CostPair;

/// The contract every bound technique fulfils.
pub trait AxisTechnique {
    /// Length of the fibers this layout was bound to.
    fn axis_len(&self) -> usize;

    /// Rewrites a raw fiber into its transformed representation, in place.
    fn preprocess_in_place(&self, fiber: &mut [f64]);

    /// Transformed copy of `fiber`.
    fn preprocess(&self, fiber: &[f64]) -> Vec<f64> {
        let mut out = fiber.to_vec();
        self.preprocess_in_place(&mut out);
        out
    }

    /// Transformed positions that move by `coefficient * delta` when raw
    /// cell `cell` moves by `delta`.
    fn alpha(&self, cell: usize) -> CoefficientMap;

    /// Weights over transformed positions whose weighted sum equals the raw
    /// sum over `start..=end`. Empty when `start > end`.
    fn beta(&self, start: usize, end: usize) -> CoefficientMap;

    /// Declared cost for the bound axis length.
    fn cost(&self) -> CostPair;
}

/// A technique bound to one axis length.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundTechnique {
    Identity(IdentityTechnique),
    PrefixSum(PrefixSumTechnique),
    SquareRootBlock(SquareRootBlockTechnique),
    BinaryTree(BinaryTreeTechnique),
    CustomBlocks(CustomBlockTechnique),
}

impl BoundTechnique {
    fn inner(&self) -> &dyn AxisTechnique {
        match self {
            BoundTechnique::Identity(t) => t,
            BoundTechnique::PrefixSum(t) => t,
            BoundTechnique::SquareRootBlock(t) => t,
            BoundTechnique::BinaryTree(t) => t,
            BoundTechnique::CustomBlocks(t) => t,
        }
    }
}

impl AxisTechnique for BoundTechnique {
    fn axis_len(&self) -> usize {
        self.inner().axis_len()
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        self.inner().preprocess_in_place(fiber)
    }

    fn alpha(&self, cell: usize) -> CoefficientMap {
        self.inner().alpha(cell)
    }

    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        self.inner().beta(start, end)
    }

    fn cost(&self) -> CostPair {
        self.inner().cost()
    }
}
