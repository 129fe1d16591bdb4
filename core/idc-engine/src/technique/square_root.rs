//! FILENAME: core/idc-engine/src/technique/square_root.rs
//! Square-root block technique.
//!
//! The fiber is cut into ceil(n / B) blocks of B cells (the last may be
//! shorter). Inside a block every position holds the local prefix sum of the
//! block, except the block's last position, the anchor, which holds the
//! global prefix sum up to and including itself:
//!
//! ```text
//! raw:          1  2 | 3  4 | 5  6
//! transformed:  1  3 | 3 10 | 5 21
//!                  ^anchor  ^anchor ^anchor
//! ```
//!
//! Any inclusive prefix is then one local value plus the anchor of the
//! previous block, so a range is at most four lookups.

use crate::coefficients::{CoefficientBuilder, CoefficientMap};
use crate::definition::CostPair;
use super::AxisTechnique;

#[derive(Debug, Clone, PartialEq)]
pub struct SquareRootBlockTechnique {
    len: usize,
    block_size: usize,
    block_count: usize,
}

impl SquareRootBlockTechnique {
    /// `block_size` is clamped to at least one cell.
    pub fn new(len: usize, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        SquareRootBlockTechnique {
            len,
            block_size,
            block_count: len.div_ceil(block_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    fn block_of(&self, position: usize) -> usize {
        position / self.block_size
    }

    /// Last position of `block`, where its anchor lives.
    fn anchor(&self, block: usize) -> usize {
        ((block + 1) * self.block_size).min(self.len) - 1
    }

    /// Adds the representation of raw[0..=position] scaled by `sign`.
    fn add_prefix(&self, builder: &mut CoefficientBuilder, position: usize, sign: f64) {
        let block = self.block_of(position);
        builder.add(position, sign);
        if position != self.anchor(block) && block > 0 {
            builder.add(self.anchor(block - 1), sign);
        }
    }
}

impl AxisTechnique for SquareRootBlockTechnique {
    fn axis_len(&self) -> usize {
        self.len
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        debug_assert_eq!(fiber.len(), self.len);
        let mut global = 0.0;
        for block in fiber.chunks_mut(self.block_size) {
            let mut local = 0.0;
            for value in block.iter_mut() {
                local += *value;
                *value = local;
            }
            global += local;
            if let Some(anchor) = block.last_mut() {
                *anchor = global;
            }
        }
    }

    /// Local prefixes from `cell` to the end of its block, then the anchor of
    /// its block and of every later block.
    fn alpha(&self, cell: usize) -> CoefficientMap {
        let block = self.block_of(cell);
        let local = cell..self.anchor(block);
        let anchors = (block..self.block_count).map(|b| self.anchor(b));
        CoefficientMap::ones(local.chain(anchors))
    }

    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        if start > end {
            return CoefficientMap::new();
        }
        let mut builder = CoefficientBuilder::new();
        self.add_prefix(&mut builder, end, 1.0);
        if start > 0 {
            self.add_prefix(&mut builder, start - 1, -1.0);
        }
        builder.build()
    }

    fn cost(&self) -> CostPair {
        CostPair::new(4, self.block_count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stores_local_prefixes_and_anchors() {
        let srps = SquareRootBlockTechnique::new(6, 2);
        let transformed = srps.preprocess(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(transformed, vec![1.0, 3.0, 3.0, 10.0, 5.0, 21.0]);
        assert_eq!(srps.cost(), CostPair::new(4, 3));
    }

    #[test]
    fn test_partial_last_block() {
        let srps = SquareRootBlockTechnique::new(7, 3);
        assert_eq!(srps.block_count(), 3);
        let raw = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let transformed = srps.preprocess(&raw);
        assert_eq!(transformed, vec![1.0, 2.0, 3.0, 1.0, 2.0, 6.0, 7.0]);
        assert_eq!(srps.beta(2, 6).apply(&transformed), 5.0);
    }

    #[test]
    fn test_beta_uses_at_most_four_positions() {
        let srps = SquareRootBlockTechnique::new(25, 5);
        for start in 0..25 {
            for end in start..25 {
                assert!(srps.beta(start, end).len() <= 4, "({}, {})", start, end);
            }
        }
    }

    #[test]
    fn test_cross_block_beta() {
        let srps = SquareRootBlockTechnique::new(9, 3);
        // prefix(7) = T[7] + T[5]; prefix(1) = T[1]
        let beta = srps.beta(2, 7);
        assert_eq!(
            beta.iter().collect::<Vec<_>>(),
            vec![(1, -1.0), (5, 1.0), (7, 1.0)]
        );
    }

    #[test]
    fn test_alpha_reaches_later_anchors_only() {
        let srps = SquareRootBlockTechnique::new(9, 3);
        let alpha = srps.alpha(3);
        assert_eq!(alpha.positions().collect::<Vec<_>>(), vec![3, 4, 5, 8]);
        assert_eq!(srps.alpha(8).positions().collect::<Vec<_>>(), vec![8]);
    }
}
