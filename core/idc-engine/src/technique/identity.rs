//! FILENAME: core/idc-engine/src/technique/identity.rs
//! No pre-aggregation: the transformed fiber is the raw fiber.

use crate::coefficients::CoefficientMap;
use crate::definition::CostPair;
use super::AxisTechnique;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityTechnique {
    len: usize,
}

impl IdentityTechnique {
    pub fn new(len: usize) -> Self {
        IdentityTechnique { len }
    }
}

impl AxisTechnique for IdentityTechnique {
    fn axis_len(&self) -> usize {
        self.len
    }

    fn preprocess_in_place(&self, fiber: &mut [f64]) {
        debug_assert_eq!(fiber.len(), self.len);
    }

    fn alpha(&self, cell: usize) -> CoefficientMap {
        CoefficientMap::single(cell, 1.0)
    }

    fn beta(&self, start: usize, end: usize) -> CoefficientMap {
        if start > end {
            return CoefficientMap::new();
        }
        CoefficientMap::ones(start..=end)
    }

    fn cost(&self) -> CostPair {
        CostPair::new(self.len as u64, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_scans_range() {
        let identity = IdentityTechnique::new(6);
        let raw = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(identity.preprocess(&raw), raw);

        let beta = identity.beta(1, 4);
        assert_eq!(beta.len(), 4);
        assert_eq!(beta.apply(&raw), 14.0);
        assert_eq!(identity.alpha(3).iter().collect::<Vec<_>>(), vec![(3, 1.0)]);
        assert_eq!(identity.cost(), CostPair::new(6, 1));
    }
}
