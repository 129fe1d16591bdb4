//! FILENAME: core/idc-engine/src/coefficients.rs
//! Sparse coefficient maps over the positions of one transformed fiber.
//!
//! Beta maps reconstruct a range sum from transformed values; alpha maps
//! describe how one raw cell change lands in the transformed fiber.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Sparse mapping from a fiber position to a real multiplier.
/// Positions are unique; iteration order is ascending by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientMap {
    entries: SmallVec<[(usize, f64); 4]>,
}

impl CoefficientMap {
    pub fn new() -> Self {
        CoefficientMap::default()
    }

    pub fn single(position: usize, coefficient: f64) -> Self {
        let mut map = CoefficientMap::new();
        map.entries.push((position, coefficient));
        map
    }

    /// Ones at every position in `positions`, which must be strictly ascending.
    pub(crate) fn ones(positions: impl IntoIterator<Item = usize>) -> Self {
        let mut map = CoefficientMap::new();
        for position in positions {
            map.push_unique(position, 1.0);
        }
        map
    }

    /// Appends an entry after the current last position.
    pub(crate) fn push_unique(&mut self, position: usize, coefficient: f64) {
        debug_assert!(
            self.entries.last().map_or(true, |&(last, _)| last < position),
            "position {} pushed out of order",
            position
        );
        self.entries.push((position, coefficient));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<f64> {
        self.entries
            .binary_search_by_key(&position, |&(p, _)| p)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(p, _)| *p)
    }

    /// Weighted sum of `fiber` at the mapped positions.
    pub fn apply(&self, fiber: &[f64]) -> f64 {
        self.entries.iter().map(|&(p, c)| c * fiber[p]).sum()
    }

    /// Adds `coefficient * scale` at every mapped position of `fiber`.
    pub fn scatter(&self, fiber: &mut [f64], scale: f64) {
        for &(p, c) in &self.entries {
            fiber[p] += c * scale;
        }
    }
}

impl FromIterator<(usize, f64)> for CoefficientMap {
    /// Merges repeated positions and drops terms that cancel to zero.
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        let mut builder = CoefficientBuilder::new();
        for (position, coefficient) in iter {
            builder.add(position, coefficient);
        }
        builder.build()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Accumulates terms that may repeat or cancel, as happens when prefix
/// representations are subtracted from each other.
#[derive(Debug, Default)]
pub struct CoefficientBuilder {
    terms: FxHashMap<usize, f64>,
}

impl CoefficientBuilder {
    pub fn new() -> Self {
        CoefficientBuilder::default()
    }

    pub fn add(&mut self, position: usize, coefficient: f64) {
        *self.terms.entry(position).or_insert(0.0) += coefficient;
    }

    pub fn add_map(&mut self, map: &CoefficientMap, scale: f64) {
        for (position, coefficient) in map.iter() {
            self.add(position, coefficient * scale);
        }
    }

    /// Drops exact zeros and sorts by position.
    pub fn build(self) -> CoefficientMap {
        let mut entries: SmallVec<[(usize, f64); 4]> = self
            .terms
            .into_iter()
            .filter(|(_, c)| *c != 0.0)
            .collect();
        entries.sort_unstable_by_key(|(p, _)| *p);
        CoefficientMap { entries }
    }
}
