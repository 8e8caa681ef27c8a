//! Kernel providers
//!
//! A [`LieKernels`] implementation performs the group math for tensors that
//! live on one kind of device. The dispatcher picks a provider by inspecting
//! the primary tensor's device and hands the call through with its arguments
//! unchanged. Providers do not re-check contiguity; the dispatcher has done
//! that before routing.
//!
//! [`CpuKernels`] is the host provider. Providers for other devices are
//! supplied by the caller (see [`crate::dispatch::DispatcherBuilder`]).

pub mod cpu;

pub use cpu::CpuKernels;

use crate::error::Result;
use crate::tensor::Tensor;

/// The nineteen group kernels a device backend provides
///
/// `group_index` selects the group (1 = SO3, 2 = SE3, 3 = Sim3); an
/// unrecognized index is the provider's error to report. Tensors carry
/// embedded elements (width N), tangent vectors (width K) or points
/// (width 3 or 4) in their last dimension; leading dimensions are batch.
///
/// Backward kernels take the upstream gradient first and return one
/// gradient per differentiable input, in argument order.
pub trait LieKernels: Send + Sync {
    /// Provider name, used in logs
    fn name(&self) -> &'static str;

    /// `X = exp(a)`
    fn exp_forward(&self, group_index: i32, a: &Tensor) -> Result<Tensor>;

    /// Gradient of `exp` with respect to `a`
    fn exp_backward(&self, group_index: i32, grad: &Tensor, a: &Tensor) -> Result<Vec<Tensor>>;

    /// `a = log(X)`
    fn log_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor>;

    /// Gradient of `log` with respect to `X`
    fn log_backward(&self, group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>>;

    /// `X⁻¹`
    fn inv_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor>;

    /// Gradient of the inverse with respect to `X`
    fn inv_backward(&self, group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>>;

    /// `X * Y`
    fn mul_forward(&self, group_index: i32, x: &Tensor, y: &Tensor) -> Result<Tensor>;

    /// Gradients of the product with respect to `X` and `Y`
    fn mul_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        y: &Tensor,
    ) -> Result<Vec<Tensor>>;

    /// `Ad(X) a`
    fn adj_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor>;

    /// Gradients of `Ad(X) a` with respect to `X` and `a`
    fn adj_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>>;

    /// `Ad(X)ᵀ a`
    fn adjt_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor>;

    /// Gradients of `Ad(X)ᵀ a` with respect to `X` and `a`
    fn adjt_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>>;

    /// `X p` for 3D points
    fn act_forward(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor>;

    /// Gradients of `X p` with respect to `X` and `p`
    fn act_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>>;

    /// `X p` for homogeneous points
    fn act4_forward(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor>;

    /// Gradients of the homogeneous action with respect to `X` and `p`
    fn act4_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>>;

    /// `4 x 4` matrix of `X`
    fn as_matrix_forward(&self, group_index: i32, x: &Tensor) -> Result<Tensor>;

    /// `N x N` tangent projector of the embedding at `X`
    fn orthogonal_projector(&self, group_index: i32, x: &Tensor) -> Result<Tensor>;

    /// `Jl⁻¹(log X) a`, the inverse left Jacobian at `X` applied to `a`
    fn jleft_forward(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor>;
}
