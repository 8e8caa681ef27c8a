//! Core Tensor type

use super::{Layout, Storage, TensorId};
use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{CpuRuntime, Device};
use std::fmt;

/// N-dimensional array tagged with the device its data lives on
///
/// `Tensor` consists of:
/// - **Storage**: Reference-counted device memory
/// - **Layout**: Shape, strides, and offset defining the view into storage
/// - **DType**: Element type (determined at runtime)
///
/// Views like `transpose`, `narrow` and `broadcast_to` share storage with the
/// source tensor and usually leave it non-contiguous. Group kernels only accept
/// contiguous tensors; call [`Tensor::contiguous`] first.
///
/// # Example
///
/// ```
/// use lietensor::tensor::Tensor;
///
/// let x = Tensor::from_slice(&[0.0f64, 0.0, 0.0, 1.0], &[1, 4]);
/// assert!(x.is_contiguous());
/// assert!(x.device().is_cpu());
/// ```
pub struct Tensor {
    id: TensorId,
    storage: Storage,
    layout: Layout,
}

impl Tensor {
    /// Create a tensor from storage and layout
    pub fn from_parts(storage: Storage, layout: Layout) -> Self {
        Self {
            id: TensorId::new(),
            storage,
            layout,
        }
    }

    /// Create a host tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a host tensor from a slice of data (fallible version)
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        let storage = Storage::from_slice(data)?;
        Ok(Self::from_parts(storage, Layout::contiguous(shape)))
    }

    /// Create a host tensor from f64 values, converted to `dtype`
    pub fn from_f64_slice(data: &[f64], shape: &[usize], dtype: DType) -> Result<Self> {
        dispatch_dtype!(dtype, T => {
            let converted: Vec<T> = data.iter().map(|&v| T::from_f64(v)).collect();
            Self::try_from_slice(&converted, shape)
        }, "from_f64_slice")
    }

    /// Create a host tensor filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        let len: usize = shape.iter().product();
        let storage = Storage::new(len, dtype)?;
        Ok(Self::from_parts(storage, Layout::contiguous(shape)))
    }

    /// Create a shape-only tensor on the meta device
    pub fn meta(shape: &[usize], dtype: DType) -> Self {
        let len: usize = shape.iter().product();
        Self::from_parts(Storage::meta(len, dtype), Layout::contiguous(shape))
    }

    /// Wrap a contiguous buffer owned by another device's runtime
    ///
    /// # Safety
    /// `ptr` must be a valid handle for `device` holding at least
    /// `shape.iter().product()` elements of `dtype`, alive as long as the
    /// returned tensor and its views.
    pub unsafe fn from_external(ptr: u64, shape: &[usize], dtype: DType, device: Device) -> Self {
        let len: usize = shape.iter().product();
        let storage = Storage::from_external(ptr, len, dtype, device);
        Self::from_parts(storage, Layout::contiguous(shape))
    }

    // ===== Accessors =====

    /// Get the tensor ID
    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &Device {
        self.storage.device()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Get size along a dimension (supports negative indexing)
    pub fn size(&self, dim: isize) -> Option<usize> {
        self.layout.dim(dim)
    }

    /// Check whether `other` is a handle to the same view of the same buffer
    pub fn same_data(&self, other: &Tensor) -> bool {
        self.storage.same_buffer(&other.storage) && self.layout == other.layout
    }

    // ===== View Operations (Zero-Copy) =====

    fn view_with(&self, layout: Layout) -> Self {
        Self::from_parts(self.storage.clone(), layout)
    }

    /// Transpose two dimensions (zero-copy)
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Result<Self> {
        let new_layout =
            self.layout
                .transpose(dim0, dim1)
                .ok_or_else(|| Error::InvalidDimension {
                    dim: dim0,
                    ndim: self.ndim(),
                })?;

        Ok(self.view_with(new_layout))
    }

    /// Reshape to a new shape (zero-copy, requires contiguous)
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        if !self.is_contiguous() {
            return Err(Error::NotContiguous { arg: "self" });
        }
        let new_layout = self
            .layout
            .reshape(shape)
            .ok_or_else(|| Error::shape_mismatch(shape, self.shape()))?;

        Ok(self.view_with(new_layout))
    }

    /// Restrict a dimension to `length` entries starting at `start` (zero-copy)
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Result<Self> {
        let dim_idx = self
            .layout
            .normalize_dim(dim)
            .ok_or(Error::InvalidDimension {
                dim,
                ndim: self.ndim(),
            })?;

        let new_layout =
            self.layout
                .narrow(dim_idx, start, length)
                .ok_or_else(|| Error::ShapeMismatch {
                    expected: vec![self.shape()[dim_idx]],
                    got: vec![start, length],
                })?;

        Ok(self.view_with(new_layout))
    }

    /// Broadcast to a target shape (zero-copy)
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        let new_layout = self
            .layout
            .broadcast_to(shape)
            .ok_or_else(|| Error::shape_mismatch(shape, self.shape()))?;

        Ok(self.view_with(new_layout))
    }

    /// Make tensor contiguous (copy if needed)
    ///
    /// Contiguous tensors come back as a view. Non-contiguous host tensors are
    /// copied into fresh storage; other devices need their own runtime for that.
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        if !self.device().is_cpu() {
            return Err(Error::DeviceMismatch {
                kernel: CpuRuntime::name(),
                device: *self.device(),
            });
        }

        let dtype = self.dtype();
        let new_storage = Storage::new(self.numel(), dtype)?;
        let elem_size = dtype.size_in_bytes();

        // SAFETY: source view lies within its storage (layouts are only built
        // through bounds-checked view ops) and the destination holds numel elements.
        unsafe {
            CpuRuntime::copy_strided(
                self.storage.ptr(),
                self.layout.offset() * elem_size,
                new_storage.ptr(),
                self.shape(),
                self.strides(),
                elem_size,
            );
        }

        Ok(Self::from_parts(new_storage, Layout::contiguous(self.shape())))
    }

    // ===== Data Access =====

    /// Copy host tensor data to a Vec (fallible version)
    pub fn try_to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if !self.is_contiguous() {
            return Err(Error::NotContiguous { arg: "self" });
        }
        let data = self
            .storage
            .host_slice::<T>(self.layout.offset(), self.numel())?;
        Ok(data.to_vec())
    }

    /// Copy host tensor data to a Vec
    ///
    /// # Panics
    ///
    /// Panics if the tensor is not a contiguous host tensor of element type `T`.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.try_to_vec().expect("Tensor::to_vec failed")
    }

    /// Copy host tensor data to a Vec<f64>, converting from the tensor dtype
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        dispatch_dtype!(self.dtype(), T => {
            Ok(self.try_to_vec::<T>()?.into_iter().map(Element::to_f64).collect())
        }, "to_f64_vec")
    }
}

impl Clone for Tensor {
    /// Clone creates a new tensor sharing the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            id: TensorId::new(),
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("device", self.device())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor({}, dtype={}, device={})",
            self.layout,
            self.dtype(),
            self.device()
        )
    }
}
