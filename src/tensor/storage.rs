//! Storage: device memory management with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{CpuRuntime, Device};
use std::sync::Arc;

/// Storage for tensor data on a device
///
/// Storage wraps device memory with reference counting, enabling zero-copy
/// views (transpose, narrow, etc.) that share the underlying buffer.
///
/// Host memory is allocated by [`CpuRuntime`] and freed when the last
/// reference is dropped. Memory on any other device belongs to an external
/// runtime and is only wrapped.
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    /// Raw device pointer (GPU address or CPU ptr cast to u64)
    ptr: u64,
    /// Number of elements (not bytes)
    len: usize,
    dtype: DType,
    device: Device,
    /// If true, we own this memory and should deallocate on drop
    owned: bool,
}

impl Storage {
    /// Allocate zeroed host storage for `len` elements of `dtype`
    pub fn new(len: usize, dtype: DType) -> Result<Self> {
        if !dtype.is_enabled() {
            return Err(Error::unsupported_dtype(dtype, "allocate"));
        }
        let ptr = CpuRuntime::allocate(len * dtype.size_in_bytes())?;

        Ok(Self::wrap(ptr, len, dtype, Device::cpu(), true))
    }

    /// Create host storage from existing data with inferred dtype
    pub fn from_slice<T: Element>(data: &[T]) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::from_bytes(bytes, T::DTYPE)
    }

    /// Create host storage from raw bytes with explicit dtype
    pub fn from_bytes(data: &[u8], dtype: DType) -> Result<Self> {
        let elem = dtype.size_in_bytes();
        if data.len() % elem != 0 {
            return Err(Error::invalid_argument(
                "data",
                format!("{} bytes is not a whole number of {dtype} elements", data.len()),
            ));
        }

        let storage = Self::new(data.len() / elem, dtype)?;
        // SAFETY: freshly allocated with exactly data.len() bytes
        unsafe { CpuRuntime::copy_in(data, storage.ptr()) };
        Ok(storage)
    }

    /// Wrap existing device memory without taking ownership
    ///
    /// # Safety
    /// - `ptr` must be a valid handle for `device`'s runtime
    /// - The memory must remain valid for the lifetime of this Storage
    /// - Caller is responsible for eventual deallocation
    pub unsafe fn from_external(ptr: u64, len: usize, dtype: DType, device: Device) -> Self {
        Self::wrap(ptr, len, dtype, device, false)
    }

    /// Storage with no backing memory, tagged with the meta device
    pub fn meta(len: usize, dtype: DType) -> Self {
        Self::wrap(0, len, dtype, Device::meta(), false)
    }

    fn wrap(ptr: u64, len: usize, dtype: DType, device: Device, owned: bool) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device,
                owned,
            }),
        }
    }

    /// Get the raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.inner.ptr
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Check whether two handles share the same buffer
    #[inline]
    pub fn same_buffer(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Typed view of `count` host elements starting at element `offset`
    pub(crate) fn host_slice<T: Element>(&self, offset: usize, count: usize) -> Result<&[T]> {
        if !self.inner.device.is_cpu() {
            return Err(Error::DeviceMismatch {
                kernel: CpuRuntime::name(),
                device: self.inner.device,
            });
        }
        if T::DTYPE != self.inner.dtype {
            return Err(Error::DTypeMismatch {
                lhs: T::DTYPE,
                rhs: self.inner.dtype,
            });
        }
        if offset + count > self.inner.len {
            return Err(Error::shape_mismatch(&[self.inner.len], &[offset + count]));
        }
        if count == 0 {
            return Ok(&[]);
        }

        // SAFETY: host buffer of `len` elements, 64-byte aligned, never written
        // after construction; the bounds were checked above.
        let base = self.inner.ptr as *const T;
        Ok(unsafe { std::slice::from_raw_parts(base.add(offset), count) })
    }
}

impl Clone for Storage {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        if self.owned && self.ptr != 0 && self.device.is_cpu() {
            CpuRuntime::deallocate(self.ptr, self.len * self.dtype.size_in_bytes());
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("device", &self.inner.device)
            .field("owned", &self.inner.owned)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
