//! FILENAME: core/idc-engine/src/technique/prefix_sum.rs
//! Running cumulative sum. Two lookups per query, a suffix rewrite per update.

use crate::coefficients::CoefficientMap;
use crate::definition::CostPair;
use super::AxisTechnique;

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixSumTechnique {
    len: usize,
}

impl PrefixSumTechnique {
    pub fn new(len: usize) -> Self {
        PrefixSumTechnique { len }
    }
}

impl AxisTechnique for PrefixSumTechnique {
    fn axis_len(&self) -> usize {
        self.len
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        debug_assert_eq!(fiber.len(), self.len);
        let mut running = 0.0;
        for value in fiber.iter_mut() {
            running += *value;
            *value = running;
        }
    }

    /// Every prefix at or after `cell` includes it.
    fn alpha(&self, cell: usize) -> CoefficientMap {
        CoefficientMap::ones(cell..self.len)
    }

    /// P[end] - P[start - 1].
    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        if start > end {
            return CoefficientMap::new();
        }
        let mut map = CoefficientMap::new();
        if start > 0 {
            map.push_unique(start - 1, -1.0);
        }
        map.push_unique(end, 1.0);
        map
    }

    fn cost(&self) -> CostPair {
        CostPair::new(2, self.len as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sum_range_is_telescoping_difference() {
        let ps = PrefixSumTechnique::new(5);
        let transformed = ps.preprocess(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(transformed, vec![1.0, 3.0, 6.0, 10.0, 15.0]);

        let beta = ps.beta(1, 3);
        assert_eq!(beta.get(3), Some(1.0));
        assert_eq!(beta.get(0), Some(-1.0));
        assert_eq!(beta.len(), 2);
        assert_eq!(beta.apply(&transformed), 9.0);
    }

    #[test]
    fn test_prefix_sum_from_start_needs_one_lookup() {
        let ps = PrefixSumTechnique::new(10);
        let beta = ps.beta(0, 5);
        assert_eq!(beta.iter().collect::<Vec<_>>(), vec![(5, 1.0)]);

        let other = ps.beta(2, 5);
        assert_eq!(other.iter().collect::<Vec<_>>(), vec![(1, -1.0), (5, 1.0)]);
    }

    #[test]
    fn test_prefix_sum_update_touches_suffix() {
        let ps = PrefixSumTechnique::new(10);
        let alpha = ps.alpha(7);
        assert_eq!(alpha.positions().collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(ps.alpha(0).len(), 10);
    }
}
