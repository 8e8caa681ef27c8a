//! CPU runtime implementation

use crate::error::{Error, Result};
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};

/// Alignment of every host allocation (AVX-512 width)
const ALIGN: usize = 64;

/// CPU memory runtime
///
/// Memory is allocated on the heap using the system allocator. Pointers are
/// passed around as `u64` handles so host and device storage share one shape.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl CpuRuntime {
    /// Human-readable name of this runtime
    pub fn name() -> &'static str {
        "cpu"
    }

    /// Allocate zeroed host memory
    ///
    /// Returns `0` for zero-sized requests.
    pub fn allocate(size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN)
            .map_err(|e| Error::Backend(format!("invalid allocation layout: {e}")))?;

        let ptr = unsafe { alloc_zeroed(layout) };

        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    /// Deallocate host memory obtained from [`CpuRuntime::allocate`]
    pub fn deallocate(ptr: u64, size_bytes: usize) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        // Same layout as allocate(), which already validated it
        if let Ok(layout) = AllocLayout::from_size_align(size_bytes, ALIGN) {
            unsafe {
                dealloc(ptr as *mut u8, layout);
            }
        }
    }

    /// Copy bytes into a host buffer
    ///
    /// # Safety
    /// `dst` must point to at least `src.len()` writable bytes.
    pub unsafe fn copy_in(src: &[u8], dst: u64) {
        if src.is_empty() || dst == 0 {
            return;
        }

        std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
    }

    /// Copy bytes out of a host buffer
    ///
    /// # Safety
    /// `src` must point to at least `dst.len()` readable bytes.
    pub unsafe fn copy_out(src: u64, dst: &mut [u8]) {
        if dst.is_empty() || src == 0 {
            return;
        }

        std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
    }

    /// Copy strided data to a contiguous buffer
    ///
    /// - `src_byte_offset`: Byte offset into source buffer
    /// - `strides`: Strides of the source tensor (in elements, not bytes)
    /// - `elem_size`: Size of each element in bytes
    ///
    /// # Safety
    /// Every element addressed by `shape`/`strides` from the offset source must
    /// be readable, and `dst_handle` must have room for the whole shape.
    pub unsafe fn copy_strided(
        src_handle: u64,
        src_byte_offset: usize,
        dst_handle: u64,
        shape: &[usize],
        strides: &[isize],
        elem_size: usize,
    ) {
        if src_handle == 0 || dst_handle == 0 {
            return;
        }

        let numel: usize = shape.iter().product();
        if numel == 0 {
            return;
        }

        let src_base = (src_handle as usize + src_byte_offset) as *const u8;
        let dst_base = dst_handle as *mut u8;

        let mut indices = vec![0usize; shape.len()];

        for dst_offset in 0..numel {
            let mut src_elem_offset: isize = 0;
            for (i, &idx) in indices.iter().enumerate() {
                src_elem_offset += (idx as isize) * strides[i];
            }

            std::ptr::copy_nonoverlapping(
                src_base.offset(src_elem_offset * elem_size as isize),
                dst_base.add(dst_offset * elem_size),
                elem_size,
            );

            // Increment indices (row-major order)
            for dim in (0..shape.len()).rev() {
                indices[dim] += 1;
                if indices[dim] < shape[dim] {
                    break;
                }
                indices[dim] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_deallocate() {
        let ptr = CpuRuntime::allocate(1024).unwrap();
        assert_ne!(ptr, 0);
        assert_eq!(ptr % ALIGN as u64, 0);
        CpuRuntime::deallocate(ptr, 1024);
    }

    #[test]
    fn test_zero_allocation() {
        let ptr = CpuRuntime::allocate(0).unwrap();
        assert_eq!(ptr, 0);
        CpuRuntime::deallocate(ptr, 0);
    }

    #[test]
    fn test_copy_roundtrip() {
        let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let ptr = CpuRuntime::allocate(data.len()).unwrap();

        let mut result = vec![0u8; data.len()];
        unsafe {
            CpuRuntime::copy_in(&data, ptr);
            CpuRuntime::copy_out(ptr, &mut result);
        }
        assert_eq!(data, result);

        CpuRuntime::deallocate(ptr, data.len());
    }

    #[test]
    fn test_copy_strided_transposed() {
        // 2x3 row-major viewed as its 3x2 transpose
        let data: Vec<u8> = vec![0, 1, 2, 3, 4, 5];
        let src = CpuRuntime::allocate(6).unwrap();
        let dst = CpuRuntime::allocate(6).unwrap();

        let mut out = vec![0u8; 6];
        unsafe {
            CpuRuntime::copy_in(&data, src);
            CpuRuntime::copy_strided(src, 0, dst, &[3, 2], &[1, 3], 1);
            CpuRuntime::copy_out(dst, &mut out);
        }
        assert_eq!(out, vec![0, 3, 1, 4, 2, 5]);

        CpuRuntime::deallocate(src, 6);
        CpuRuntime::deallocate(dst, 6);
    }
}
