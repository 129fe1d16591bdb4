//! FILENAME: core/idc-engine/src/technique/custom_block.rs
//! Custom block partition technique.
//!
//! The caller chooses the block sizes. Each block stores only its local
//! prefix sums, so an update stays inside one block while a query pays one
//! lookup per block boundary it crosses. Fewer, larger blocks make queries
//! cheaper and updates dearer.

use crate::coefficients::{CoefficientBuilder, CoefficientMap};
use crate::definition::CostPair;
use super::AxisTechnique;

/// Start position of each block that fits on an axis of `len` cells.
///
/// Sizes are taken in order and the block that reaches `len` is cut short.
/// Cells past the sum of all sizes form one trailing block.
pub(crate) fn block_starts(block_sizes: &[usize], len: usize) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut position = 0;
    for &size in block_sizes {
        if position >= len {
            break;
        }
        starts.push(position);
        position += size.max(1);
    }
    if position < len {
        starts.push(position);
    }
    starts
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomBlockTechnique {
    len: usize,
    /// Block start positions, ascending, first is 0.
    starts: Vec<usize>,
}

impl CustomBlockTechnique {
    pub fn new(len: usize, block_sizes: &[usize]) -> Self {
        CustomBlockTechnique {
            len,
            starts: block_starts(block_sizes, len),
        }
    }

    pub fn block_count(&self) -> usize {
        self.starts.len()
    }

    /// Block sizes as laid out on this axis.
    pub fn block_sizes(&self) -> Vec<usize> {
        (0..self.starts.len())
            .map(|b| self.block_end(b) - self.starts[b])
            .collect()
    }

    fn block_of(&self, position: usize) -> usize {
        self.starts.partition_point(|&start| start <= position) - 1
    }

    /// One past the last position of `block`.
    fn block_end(&self, block: usize) -> usize {
        self.starts.get(block + 1).copied().unwrap_or(self.len)
    }
}

impl AxisTechnique for CustomBlockTechnique {
    fn axis_len(&self) -> usize {
        self.len
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        debug_assert_eq!(fiber.len(), self.len);
        for block in 0..self.starts.len() {
            let mut local = 0.0;
            for value in &mut fiber[self.starts[block]..self.block_end(block)] {
                local += *value;
                *value = local;
            }
        }
    }

    /// Local prefixes from `cell` to the end of its block.
    fn alpha(&self, cell: usize) -> CoefficientMap {
        let block = self.block_of(cell);
        CoefficientMap::ones(cell..self.block_end(block))
    }

    /// Last local prefix of every block from the one holding `start` up to
    /// the one before `end`, plus the local prefix at `end`, minus the local
    /// prefix just before `start` when it shares a block with `start`.
    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        if start > end {
            return CoefficientMap::new();
        }
        let first = self.block_of(start);
        let last = self.block_of(end);

        let mut builder = CoefficientBuilder::new();
        if start > self.starts[first] {
            builder.add(start - 1, -1.0);
        }
        for block in first..last {
            builder.add(self.block_end(block) - 1, 1.0);
        }
        builder.add(end, 1.0);
        builder.build()
    }

    fn cost(&self) -> CostPair {
        let blocks = self.starts.len() as u64;
        CostPair::new(blocks, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_starts() {
        assert_eq!(block_starts(&[2, 2, 2], 6), vec![0, 2, 4]);
        assert_eq!(block_starts(&[4, 4], 6), vec![0, 4]);
        assert_eq!(block_starts(&[2], 5), vec![0, 2]);
        assert_eq!(block_starts(&[3, 3, 3, 3], 10), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_local_prefixes_restart_per_block() {
        let lps = CustomBlockTechnique::new(6, &[1, 3, 2]);
        let transformed = lps.preprocess(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(transformed, vec![1.0, 2.0, 5.0, 9.0, 5.0, 11.0]);
        assert_eq!(lps.block_sizes(), vec![1, 3, 2]);
    }

    #[test]
    fn test_beta_collects_one_term_per_crossed_boundary() {
        let lps = CustomBlockTechnique::new(6, &[2, 2, 2]);
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let transformed = lps.preprocess(&raw);

        let beta = lps.beta(1, 4);
        assert_eq!(
            beta.iter().collect::<Vec<_>>(),
            vec![(0, -1.0), (1, 1.0), (3, 1.0), (4, 1.0)]
        );
        assert_eq!(beta.apply(&transformed), 14.0);

        // Inside one block it degenerates to a local difference.
        assert_eq!(lps.beta(3, 3).iter().collect::<Vec<_>>(), vec![(2, -1.0), (3, 1.0)]);
    }

    #[test]
    fn test_alpha_stays_in_block() {
        let lps = CustomBlockTechnique::new(6, &[2, 2, 2]);
        assert_eq!(lps.alpha(2).positions().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(lps.alpha(5).positions().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_cost_counts_blocks() {
        let lps = CustomBlockTechnique::new(10, &[5, 5]);
        assert_eq!(lps.cost(), CostPair::new(2, 2));
    }
}
