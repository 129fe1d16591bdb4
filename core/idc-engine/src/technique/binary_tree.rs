//! FILENAME: core/idc-engine/src/technique/binary_tree.rs
//! Binary-tree hierarchical technique.
//!
//! The fiber is split recursively into halves `[lo, mid)` and `[mid, hi)` with
//! `mid = lo + (hi - lo) / 2` until single cells remain. A balanced tree over
//! n leaves has 2n - 1 nodes, but only n of them are stored: the root and
//! every left child. Each stored node keeps its subtree sum in the slot of its
//! last cell (`hi - 1`), which no other stored node claims. A right child's
//! sum is implied by its parent minus its left sibling.
//!
//! ```text
//! raw:          1  2  3  4
//! tree:         [0,4)=10 -> [0,2)=3 -> [0,1)=1
//!                                     [1,2)  (implied)
//!                        -> [2,4)  (implied) -> [2,3)=3
//!                                               [3,4)  (implied)
//! transformed:  1  3  3  10
//! ```
//!
//! Nodes are never materialized: every walk recomputes `mid` from `(lo, hi)`.

use smallvec::SmallVec;

use crate::coefficients::{CoefficientBuilder, CoefficientMap};
use crate::definition::{ceil_log2, CostPair};
use super::AxisTechnique;

/// Signed slots whose sum is one node's subtree total.
type NodeTerms = SmallVec<[(usize, f64); 8]>;

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryTreeTechnique {
    len: usize,
    height: u64,
}

impl BinaryTreeTechnique {
    pub fn new(len: usize) -> Self {
        BinaryTreeTechnique {
            len,
            height: ceil_log2(len),
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Leaves the subtree layout of `[lo, hi)` in `fiber[lo..hi - 1]` and the
    /// subtree total in `fiber[hi - 1]`. Returns the total.
    fn build(fiber: &mut [f64], lo: usize, hi: usize) -> f64 {
        if hi - lo == 1 {
            return fiber[lo];
        }
        let mid = lo + (hi - lo) / 2;
        let left = Self::build(fiber, lo, mid);
        let right = Self::build(fiber, mid, hi);
        let total = left + right;
        fiber[hi - 1] = total;
        total
    }

    /// Canonical cover of `start..=end` by maximal subtrees. `terms` expresses
    /// the total of node `[lo, hi)` in stored slots.
    fn cover(
        &self,
        builder: &mut CoefficientBuilder,
        terms: &NodeTerms,
        lo: usize,
        hi: usize,
        start: usize,
        end: usize,
    ) {
        if end < lo || start >= hi {
            return;
        }
        if start <= lo && hi - 1 <= end {
            for &(slot, coefficient) in terms {
                builder.add(slot, coefficient);
            }
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let left: NodeTerms = smallvec::smallvec![(mid - 1, 1.0)];
        let mut right = terms.clone();
        right.push((mid - 1, -1.0));

        self.cover(builder, &left, lo, mid, start, end);
        self.cover(builder, &right, mid, hi, start, end);
    }
}

impl AxisTechnique for BinaryTreeTechnique {
    fn axis_len(&self) -> usize {
        self.len
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        debug_assert_eq!(fiber.len(), self.len);
        if !fiber.is_empty() {
            Self::build(fiber, 0, fiber.len());
        }
    }

    /// Stored nodes on the root-to-leaf path of `cell`.
    fn alpha(&self, cell: usize) -> CoefficientMap {
        // Slots come out strictly descending along the path.
        let mut path: SmallVec<[usize; 16]> = SmallVec::new();
        path.push(self.len - 1);

        let (mut lo, mut hi) = (0, self.len);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if cell < mid {
                path.push(mid - 1);
                hi = mid;
            } else {
                lo = mid;
            }
        }
        CoefficientMap::ones(path.into_iter().rev())
    }

    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        if start > end {
            return CoefficientMap::new();
        }
        let mut builder = CoefficientBuilder::new();
        let root: NodeTerms = smallvec::smallvec![(self.len - 1, 1.0)];
        self.cover(&mut builder, &root, 0, self.len, start, end);
        builder.build()
    }

    fn cost(&self) -> CostPair {
        let height = self.height.max(1);
        CostPair::new(height, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fits_in_fiber() {
        let tree = BinaryTreeTechnique::new(4);
        let transformed = tree.preprocess(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(transformed, vec![1.0, 3.0, 3.0, 10.0]);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_alpha_touches_stored_path_nodes() {
        let tree = BinaryTreeTechnique::new(4);
        let alpha = tree.alpha(2);
        assert_eq!(alpha.len(), 2);
        assert_eq!(alpha.positions().collect::<Vec<_>>(), vec![2, 3]);

        let mut transformed = tree.preprocess(&[1.0, 1.0, 1.0, 1.0]);
        alpha.scatter(&mut transformed, 1.0);
        assert_eq!(transformed, tree.preprocess(&[1.0, 1.0, 2.0, 1.0]));
    }

    #[test]
    fn test_alpha_is_logarithmic() {
        let tree = BinaryTreeTechnique::new(1000);
        for cell in 0..1000 {
            assert!(tree.alpha(cell).len() as u64 <= tree.height() + 1);
        }
    }

    #[test]
    fn test_beta_is_logarithmic() {
        let tree = BinaryTreeTechnique::new(64);
        for start in 0..64 {
            for end in start..64 {
                assert!(tree.beta(start, end).len() as u64 <= 2 * tree.height() + 1);
            }
        }
    }

    #[test]
    fn test_whole_fiber_is_root_slot() {
        let tree = BinaryTreeTechnique::new(13);
        let beta = tree.beta(0, 12);
        assert_eq!(beta.iter().collect::<Vec<_>>(), vec![(12, 1.0)]);
    }

    #[test]
    fn test_single_cell_fiber() {
        let tree = BinaryTreeTechnique::new(1);
        assert_eq!(tree.preprocess(&[5.0]), vec![5.0]);
        assert_eq!(tree.alpha(0).positions().collect::<Vec<_>>(), vec![0]);
        assert_eq!(tree.beta(0, 0).apply(&[5.0]), 5.0);
        assert_eq!(tree.cost(), CostPair::new(1, 1));
    }
}
