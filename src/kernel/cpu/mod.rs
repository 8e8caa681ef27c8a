//! Host kernel provider
//!
//! Reference implementation of every group kernel in f64. Batches are
//! processed row by row; with the `rayon` feature, batches of at least
//! [`CpuKernels::rayon_min_len`] rows are split across the thread pool.

mod backward;
mod batch;
mod forward;

use super::LieKernels;
use crate::error::Result;
use crate::group::{GroupId, Se3, Sim3, So3};
use crate::tensor::Tensor;

/// Default minimum rows per parallel task
pub const DEFAULT_RAYON_MIN_LEN: usize = 64;

/// Resolve a runtime group index to a concrete `LieGroup` type
///
/// Returns `Error::InvalidGroup` from the enclosing function for an
/// unrecognized index.
macro_rules! with_group {
    ($group_index:expr, $G:ident => $body:expr) => {
        match GroupId::try_from($group_index)? {
            GroupId::So3 => {
                type $G = So3;
                $body
            }
            GroupId::Se3 => {
                type $G = Se3;
                $body
            }
            GroupId::Sim3 => {
                type $G = Sim3;
                $body
            }
        }
    };
}

/// Kernel provider for tensors in host memory
#[derive(Clone, Debug)]
pub struct CpuKernels {
    min_len: usize,
}

impl CpuKernels {
    /// Create a provider with default parallelism settings
    pub fn new() -> Self {
        Self {
            min_len: DEFAULT_RAYON_MIN_LEN,
        }
    }

    /// Set the minimum number of batch rows handed to one parallel task
    ///
    /// Batches smaller than this run on the calling thread. Values below 1
    /// are treated as 1.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(1);
        self
    }

    /// Minimum rows per parallel task
    #[inline]
    pub fn rayon_min_len(&self) -> usize {
        self.min_len
    }
}

impl Default for CpuKernels {
    fn default() -> Self {
        Self::new()
    }
}

impl LieKernels for CpuKernels {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn exp_forward(&self, group_index: i32, a: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::exp::<G>(self, a))
    }

    fn exp_backward(&self, group_index: i32, grad: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::exp::<G>(self, grad, a))
    }

    fn log_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::log::<G>(self, x))
    }

    fn log_backward(&self, group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::log::<G>(self, grad, x))
    }

    fn inv_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::inv::<G>(self, x))
    }

    fn inv_backward(&self, group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::inv::<G>(self, grad, x))
    }

    fn mul_forward(&self, group_index: i32, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::mul::<G>(self, x, y))
    }

    fn mul_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        y: &Tensor,
    ) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::mul::<G>(self, grad, x, y))
    }

    fn adj_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::adj::<G>(self, x, a, false))
    }

    fn adj_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::adj::<G>(self, grad, x, a))
    }

    fn adjt_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::adj::<G>(self, x, a, true))
    }

    fn adjt_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::adjt::<G>(self, grad, x, a))
    }

    fn act_forward(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::act::<G>(self, x, p))
    }

    fn act_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::act::<G>(self, grad, x, p))
    }

    fn act4_forward(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::act4::<G>(self, x, p))
    }

    fn act4_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>> {
        with_group!(group_index, G => backward::act4::<G>(self, grad, x, p))
    }

    fn as_matrix_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::as_matrix::<G>(self, x))
    }

    fn orthogonal_projector(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::projector::<G>(self, x))
    }

    fn jleft_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        with_group!(group_index, G => forward::jleft_inverse::<G>(self, x, a))
    }
}

/// Shared row conversions between nalgebra values and flat buffers
mod rows {
    use nalgebra::{DMatrix, DVector, Matrix4};

    #[inline]
    pub fn vector(row: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(row)
    }

    /// Write `v` into the front of `out`, leaving the rest untouched
    #[inline]
    pub fn put_vector(out: &mut [f64], v: &DVector<f64>) {
        out[..v.len()].copy_from_slice(v.as_slice());
    }

    /// Write a matrix in row-major order
    pub fn put_matrix(out: &mut [f64], m: &DMatrix<f64>) {
        let cols = m.ncols();
        for r in 0..m.nrows() {
            for c in 0..cols {
                out[r * cols + c] = m[(r, c)];
            }
        }
    }

    pub fn put_matrix4(out: &mut [f64], m: &Matrix4<f64>) {
        for r in 0..4 {
            for c in 0..4 {
                out[r * 4 + c] = m[(r, c)];
            }
        }
    }
}
