//! Layout: shape, strides, and offset for tensor memory layout

use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Batched group elements rarely exceed 4 dimensions, so we stack-allocate up to 4
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each dimension
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Layout describes the memory layout of a tensor
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use lietensor::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        if shape.is_empty() {
            return SmallVec::new();
        }

        let mut strides: Strides = SmallVec::with_capacity(shape.len());
        let mut stride = 1isize;

        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride *= dim as isize;
        }

        strides.reverse();
        strides
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check if elements are laid out row-major without gaps
    ///
    /// The starting offset does not matter, and neither do strides of
    /// size-1 dimensions (they are never stepped over).
    pub fn is_contiguous(&self) -> bool {
        if self.elem_count() == 0 {
            return true;
        }

        let mut expected = 1isize;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()).rev() {
            if dim == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= dim as isize;
        }
        true
    }

    /// Get size along a specific dimension
    ///
    /// Supports negative indexing: -1 is the last dimension
    pub fn dim(&self, d: isize) -> Option<usize> {
        let idx = self.normalize_dim(d)?;
        Some(self.shape[idx])
    }

    /// Normalize a dimension index (handle negative indices)
    pub fn normalize_dim(&self, d: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let idx = if d < 0 { ndim + d } else { d };
        if idx >= 0 && idx < ndim {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Create a transposed layout (swap two dimensions)
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Option<Self> {
        let d0 = self.normalize_dim(dim0)?;
        let d1 = self.normalize_dim(dim1)?;

        let mut new_shape = self.shape.clone();
        let mut new_strides = self.strides.clone();

        new_shape.swap(d0, d1);
        new_strides.swap(d0, d1);

        Some(Self {
            shape: new_shape,
            strides: new_strides,
            offset: self.offset,
        })
    }

    /// Create a reshaped layout (if contiguous)
    ///
    /// Returns None if the tensor is not contiguous or element counts differ
    pub fn reshape(&self, new_shape: &[usize]) -> Option<Self> {
        if !self.is_contiguous() {
            return None;
        }

        let new_count: usize = new_shape.iter().product();
        if new_count != self.elem_count() {
            return None;
        }

        let mut layout = Self::contiguous(new_shape);
        layout.offset = self.offset;
        Some(layout)
    }

    /// Restrict a dimension to `length` entries starting at `start`
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Option<Self> {
        if dim >= self.ndim() || start + length > self.shape[dim] {
            return None;
        }

        let mut new_shape = self.shape.clone();
        new_shape[dim] = length;
        let offset = self.offset as isize + start as isize * self.strides[dim];

        Some(Self::new(new_shape, self.strides.clone(), offset as usize))
    }

    /// Create a broadcast layout to a target shape
    ///
    /// Returns None if shapes are not broadcastable
    pub fn broadcast_to(&self, target: &[usize]) -> Option<Self> {
        if target.len() < self.ndim() {
            return None;
        }

        let mut new_shape = Shape::new();
        let mut new_strides = Strides::new();

        let pad = target.len() - self.ndim();
        for &t in &target[..pad] {
            new_shape.push(t);
            new_strides.push(0);
        }

        for ((&s, &st), &t) in self
            .shape
            .iter()
            .zip(self.strides.iter())
            .zip(&target[pad..])
        {
            if s == t {
                new_shape.push(t);
                new_strides.push(st);
            } else if s == 1 {
                new_shape.push(t);
                new_strides.push(0);
            } else {
                return None;
            }
        }

        Some(Self::new(new_shape, new_strides, self.offset))
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(&[2, 3, 4]);
        assert_eq!(layout.shape(), &[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert_eq!(layout.elem_count(), 24);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_scalar_layout() {
        let layout = Layout::contiguous(&[]);
        assert!(layout.shape().is_empty());
        assert_eq!(layout.elem_count(), 1);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_transpose_breaks_contiguity() {
        let layout = Layout::contiguous(&[4, 7]);
        let t = layout.transpose(0, 1).unwrap();
        assert_eq!(t.shape(), &[7, 4]);
        assert_eq!(t.strides(), &[1, 7]);
        assert!(!t.is_contiguous());
    }

    #[test]
    fn test_narrow_rows_stays_contiguous() {
        let layout = Layout::contiguous(&[5, 4]);
        let rows = layout.narrow(0, 2, 3).unwrap();
        assert_eq!(rows.shape(), &[3, 4]);
        assert_eq!(rows.offset(), 8);
        assert!(rows.is_contiguous());
    }

    #[test]
    fn test_narrow_columns_leaves_gaps() {
        let layout = Layout::contiguous(&[5, 7]);
        let cols = layout.narrow(1, 0, 4).unwrap();
        assert_eq!(cols.shape(), &[5, 4]);
        assert!(!cols.is_contiguous());
        assert!(layout.narrow(1, 5, 4).is_none());
    }

    #[test]
    fn test_broadcast_is_not_contiguous() {
        let layout = Layout::contiguous(&[1, 4]);
        let b = layout.broadcast_to(&[3, 4]).unwrap();
        assert_eq!(b.strides(), &[0, 1]);
        assert!(!b.is_contiguous());
        assert!(layout.broadcast_to(&[3, 5]).is_none());
    }

    #[test]
    fn test_unit_dims_ignored_for_contiguity() {
        // [4, 1] transposed has strides [1, 1]; the unit dim's stride is free
        let layout = Layout::contiguous(&[4, 1]).transpose(0, 1).unwrap();
        assert_eq!(layout.shape(), &[1, 4]);
        assert_eq!(layout.strides(), &[1, 1]);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_reshape_requires_contiguous() {
        let layout = Layout::contiguous(&[2, 6]);
        assert_eq!(layout.reshape(&[3, 4]).unwrap().strides(), &[4, 1]);
        assert!(layout.reshape(&[5]).is_none());
        assert!(layout.transpose(0, 1).unwrap().reshape(&[12]).is_none());
    }
}
