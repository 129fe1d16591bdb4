//! FILENAME: core/idc-engine/src/shape.rs
//! PURPOSE: Row-major n-dimensional layout and the dense raw cube.
//! CONTEXT: Cells live in one flat Vec<f64>. The last axis is contiguous;
//! a fiber along axis k is the run of cells starting at a base offset and
//! stepping by stride(k).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{IdcError, Result};

// ============================================================================
// SHAPE
// ============================================================================

/// Axis lengths with cached row-major strides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct CubeShape {
    dims: SmallVec<[usize; 4]>,
    strides: SmallVec<[usize; 4]>,
}

impl CubeShape {
    /// Every axis must be non-empty.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() {
            return Err(IdcError::Configuration("cube must have at least one axis".to_string()));
        }
        if let Some(axis) = dims.iter().position(|&len| len == 0) {
            return Err(IdcError::Configuration(format!("axis {} has length 0", axis)));
        }

        let mut strides: SmallVec<[usize; 4]> = SmallVec::from_elem(1, dims.len());
        for axis in (0..dims.len() - 1).rev() {
            strides[axis] = strides[axis + 1] * dims[axis + 1];
        }

        Ok(CubeShape {
            dims: SmallVec::from_slice(dims),
            strides,
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn axis_len(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Always false: every axis has at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Flat offset of `indices`. Indices must already be in bounds.
    pub fn offset(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(&self.strides)
            .map(|(i, stride)| i * stride)
            .sum()
    }

    /// Bounds-checks `indices` and returns their flat offset.
    pub fn check_indices(&self, indices: &[usize]) -> Result<usize> {
        self.check_arity(indices.len())?;
        for (axis, (&index, &len)) in indices.iter().zip(&self.dims).enumerate() {
            if index >= len {
                return Err(IdcError::IndexOutOfBounds { axis, index, len });
            }
        }
        Ok(self.offset(indices))
    }

    pub(crate) fn check_arity(&self, actual: usize) -> Result<()> {
        if actual != self.ndim() {
            return Err(IdcError::DimensionMismatch {
                expected: self.ndim(),
                actual,
            });
        }
        Ok(())
    }

    /// Base offsets of every fiber along `axis`.
    pub fn fiber_starts(&self, axis: usize) -> impl Iterator<Item = usize> {
        let outer: usize = self.dims[..axis].iter().product();
        let stride = self.strides[axis];
        let span = self.dims[axis] * stride;
        (0..outer).flat_map(move |o| (0..stride).map(move |r| o * span + r))
    }

    /// Number of fibers along `axis`.
    pub fn fiber_count(&self, axis: usize) -> usize {
        self.len() / self.dims[axis]
    }
}

impl TryFrom<Vec<usize>> for CubeShape {
    type Error = IdcError;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        CubeShape::new(&dims)
    }
}

impl From<CubeShape> for Vec<usize> {
    fn from(shape: CubeShape) -> Self {
        shape.dims.into_vec()
    }
}

/// Visits every tuple `t` with `t[k] < extents[k]`, last axis fastest.
/// Visits nothing when any extent is zero.
pub(crate) fn for_each_tuple(extents: &[usize], mut visit: impl FnMut(&[usize])) {
    if extents.iter().any(|&e| e == 0) {
        return;
    }
    let mut tuple: SmallVec<[usize; 4]> = SmallVec::from_elem(0, extents.len());
    loop {
        visit(&tuple);

        // Advance like an odometer.
        let mut axis = extents.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            tuple[axis] += 1;
            if tuple[axis] < extents[axis] {
                break;
            }
            tuple[axis] = 0;
        }
    }
}

// ============================================================================
// DENSE CUBE
// ============================================================================

/// The raw n-dimensional array of values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseCube {
    shape: CubeShape,
    data: Vec<f64>,
}

impl DenseCube {
    pub fn zeros(dims: &[usize]) -> Result<Self> {
        Self::filled(dims, 0.0)
    }

    pub fn filled(dims: &[usize], value: f64) -> Result<Self> {
        let shape = CubeShape::new(dims)?;
        let data = vec![value; shape.len()];
        Ok(DenseCube { shape, data })
    }

    /// `data` must hold exactly one value per cell, row-major.
    pub fn from_vec(dims: &[usize], data: Vec<f64>) -> Result<Self> {
        let shape = CubeShape::new(dims)?;
        if data.len() != shape.len() {
            return Err(IdcError::Configuration(format!(
                "shape {:?} needs {} values, got {}",
                dims,
                shape.len(),
                data.len()
            )));
        }
        Ok(DenseCube { shape, data })
    }

    /// Builds a cube by evaluating `f` at every index tuple.
    pub fn from_fn(dims: &[usize], mut f: impl FnMut(&[usize]) -> f64) -> Result<Self> {
        let shape = CubeShape::new(dims)?;
        let mut data = Vec::with_capacity(shape.len());
        for_each_tuple(shape.dims(), |tuple| data.push(f(tuple)));
        Ok(DenseCube { shape, data })
    }

    pub fn shape(&self) -> &CubeShape {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Number of f64 slots held.
    pub fn storage_len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, indices: &[usize]) -> Result<f64> {
        let offset = self.shape.check_indices(indices)?;
        Ok(self.data[offset])
    }

    pub fn set(&mut self, indices: &[usize], value: f64) -> Result<()> {
        let offset = self.shape.check_indices(indices)?;
        self.data[offset] = value;
        Ok(())
    }

    pub(crate) fn add_at_offset(&mut self, offset: usize, delta: f64) {
        self.data[offset] += delta;
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Reference sum over the inclusive hyper-rectangle `ranges` by visiting
    /// every cell. Any axis with start > end yields 0.
    pub fn brute_force_sum(&self, ranges: &[(usize, usize)]) -> Result<f64> {
        self.shape.check_arity(ranges.len())?;
        for (axis, &(start, end)) in ranges.iter().enumerate() {
            let len = self.shape.axis_len(axis);
            if start <= end && end >= len {
                return Err(IdcError::IndexOutOfBounds { axis, index: end, len });
            }
        }
        if ranges.iter().any(|&(start, end)| start > end) {
            return Ok(0.0);
        }

        let extents: SmallVec<[usize; 4]> = ranges.iter().map(|&(s, e)| e - s + 1).collect();
        let mut sum = 0.0;
        for_each_tuple(&extents, |tuple| {
            let offset: usize = tuple
                .iter()
                .zip(ranges)
                .enumerate()
                .map(|(axis, (t, (start, _)))| (start + t) * self.shape.stride(axis))
                .sum();
            sum += self.data[offset];
        });
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_are_row_major() {
        let shape = CubeShape::new(&[2, 3, 4]).unwrap();
        assert_eq!(shape.len(), 24);
        assert_eq!(shape.stride(0), 12);
        assert_eq!(shape.stride(1), 4);
        assert_eq!(shape.stride(2), 1);
        assert_eq!(shape.offset(&[1, 2, 3]), 23);
    }

    #[test]
    fn test_check_indices() {
        let shape = CubeShape::new(&[2, 3]).unwrap();
        assert_eq!(shape.check_indices(&[1, 2]), Ok(5));
        assert_eq!(
            shape.check_indices(&[1, 3]),
            Err(IdcError::IndexOutOfBounds { axis: 1, index: 3, len: 3 })
        );
        assert_eq!(
            shape.check_indices(&[1]),
            Err(IdcError::DimensionMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_fiber_starts_cover_every_cell_once() {
        let shape = CubeShape::new(&[2, 3, 4]).unwrap();
        for axis in 0..3 {
            let mut seen = vec![0usize; shape.len()];
            let mut fibers = 0;
            for start in shape.fiber_starts(axis) {
                fibers += 1;
                for k in 0..shape.axis_len(axis) {
                    seen[start + k * shape.stride(axis)] += 1;
                }
            }
            assert_eq!(fibers, shape.fiber_count(axis));
            assert!(seen.iter().all(|&count| count == 1), "axis {}", axis);
        }
    }

    #[test]
    fn test_brute_force_sum() {
        let cube = DenseCube::from_fn(&[3, 4], |t| (t[0] * 4 + t[1]) as f64).unwrap();
        assert_eq!(cube.total(), 66.0);
        // rows 1..=2, cols 1..=2: 5 + 6 + 9 + 10
        assert_eq!(cube.brute_force_sum(&[(1, 2), (1, 2)]), Ok(30.0));
        assert_eq!(cube.brute_force_sum(&[(2, 1), (0, 3)]), Ok(0.0));
        assert!(cube.brute_force_sum(&[(0, 3), (0, 0)]).is_err());
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(DenseCube::from_vec(&[2, 2], vec![1.0; 3]).is_err());
        assert!(DenseCube::zeros(&[]).is_err());
    }

    #[test]
    fn test_shape_serializes_as_dims() {
        let shape = CubeShape::new(&[4, 5]).unwrap();
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(json, "[4,5]");
        let back: CubeShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
        assert!(serde_json::from_str::<CubeShape>("[4,0]").is_err());
    }
}
