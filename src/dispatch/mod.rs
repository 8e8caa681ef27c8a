//! Operation dispatch
//!
//! The [`Dispatcher`] is a validation and routing shim. Every operation:
//!
//! 1. checks that each tensor argument is contiguous, in a fixed order,
//!    failing with [`Error::NotContiguous`] naming the first offender;
//! 2. picks a kernel provider from the primary tensor's device (the first
//!    group-element argument, or `a` for [`Dispatcher::expm`]);
//! 3. forwards the call with its arguments and group index untouched and
//!    returns the provider's result as is.
//!
//! When no provider serves the device, forward operations hand back their
//! primary input and backward operations return an empty list, unless the
//! dispatcher was configured with [`FallbackPolicy::Error`].
//!
//! ```
//! use lietensor::dispatch::Dispatcher;
//! use lietensor::tensor::Tensor;
//!
//! let dispatcher = Dispatcher::new();
//! let a = Tensor::from_slice(&[0.0f64, 0.0, 0.0], &[1, 3]);
//! let x = dispatcher.expm(1, &a)?;
//! assert_eq!(x.to_vec::<f64>(), vec![0.0, 0.0, 0.0, 1.0]);
//! # Ok::<(), lietensor::error::Error>(())
//! ```

mod config;
mod registry;

pub use config::{DispatchConfig, FallbackPolicy};
pub use registry::{lookup, OpKind, OpOutput, OpSpec, OPS};

use crate::error::{Error, Result};
use crate::kernel::LieKernels;
use crate::runtime::{Device, DeviceType};
use crate::tensor::Tensor;
use log::{debug, trace, warn};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "cpu")]
use crate::kernel::CpuKernels;

/// Fail with `NotContiguous` naming `arg`
#[inline]
fn ensure_contiguous(tensor: &Tensor, arg: &'static str) -> Result<()> {
    if tensor.is_contiguous() {
        Ok(())
    } else {
        Err(Error::NotContiguous { arg })
    }
}

/// Routes group operations to per-device kernel providers
pub struct Dispatcher {
    cpu: Option<Arc<dyn LieKernels>>,
    #[cfg(feature = "cuda")]
    cuda: Option<Arc<dyn LieKernels>>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Dispatcher with the default providers and configuration
    ///
    /// With the `cpu` feature (on by default) host tensors are served by
    /// [`crate::kernel::CpuKernels`]. No GPU provider is registered.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Process-wide default dispatcher, used by [`crate::ops`]
    pub fn global() -> &'static Dispatcher {
        static GLOBAL: OnceLock<Dispatcher> = OnceLock::new();
        GLOBAL.get_or_init(Dispatcher::new)
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Provider serving tensors on `device`, if any
    pub fn provider_for(&self, device: &Device) -> Option<&dyn LieKernels> {
        match device.kind() {
            DeviceType::Cpu => self.cpu.as_deref(),
            #[cfg(feature = "cuda")]
            DeviceType::Cuda => self.cuda.as_deref(),
            _ => None,
        }
    }

    fn route(&self, op: &'static str, primary: &Tensor) -> Result<Option<&dyn LieKernels>> {
        let device = primary.device();
        match self.provider_for(device) {
            Some(kernels) => {
                trace!("{op}: {} on {device} -> {}", primary.id(), kernels.name());
                Ok(Some(kernels))
            }
            None => match self.config.fallback() {
                FallbackPolicy::Passthrough => {
                    warn!("{op}: no kernel provider for {device}, returning input unchanged");
                    Ok(None)
                }
                FallbackPolicy::Error => Err(Error::UnsupportedDevice {
                    device: *device,
                    op,
                }),
            },
        }
    }

    /// Route a forward op; on an unmatched device return `fallback`
    fn forward<F>(
        &self,
        op: &'static str,
        primary: &Tensor,
        fallback: &Tensor,
        f: F,
    ) -> Result<Tensor>
    where
        F: FnOnce(&dyn LieKernels) -> Result<Tensor>,
    {
        match self.route(op, primary)? {
            Some(kernels) => f(kernels),
            None => Ok(fallback.clone()),
        }
    }

    /// Route a backward op; on an unmatched device return no gradients
    fn backward<F>(&self, op: &'static str, primary: &Tensor, f: F) -> Result<Vec<Tensor>>
    where
        F: FnOnce(&dyn LieKernels) -> Result<Vec<Tensor>>,
    {
        match self.route(op, primary)? {
            Some(kernels) => f(kernels),
            None => Ok(Vec::new()),
        }
    }

    // ===== Exponential / logarithm =====

    /// Exponential map: tangent `a` (`[..., K]`) to group element (`[..., N]`)
    pub fn expm(&self, group_index: i32, a: &Tensor) -> Result<Tensor> {
        ensure_contiguous(a, "a")?;
        self.forward("expm", a, a, |k| k.exp_forward(group_index, a))
    }

    /// Gradient of [`Dispatcher::expm`]: `[da]`
    pub fn expm_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(a, "a")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("expm_backward", a, |k| k.exp_backward(group_index, grad, a))
    }

    /// Logarithm map: group element to tangent vector
    pub fn logm(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        self.forward("logm", x, x, |k| k.log_forward(group_index, x))
    }

    /// Gradient of [`Dispatcher::logm`]: `[dX]`
    pub fn logm_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("logm_backward", x, |k| k.log_backward(group_index, grad, x))
    }

    // ===== Group structure =====

    /// Group inverse
    pub fn inv(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        self.forward("inv", x, x, |k| k.inv_forward(group_index, x))
    }

    /// Gradient of [`Dispatcher::inv`]: `[dX]`
    pub fn inv_backward(&self, group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("inv_backward", x, |k| k.inv_backward(group_index, grad, x))
    }

    /// Group product `X * Y`
    pub fn mul(&self, group_index: i32, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(y, "Y")?;
        self.forward("mul", x, x, |k| k.mul_forward(group_index, x, y))
    }

    /// Gradient of [`Dispatcher::mul`]: `[dX, dY]`
    pub fn mul_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        y: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(y, "Y")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("mul_backward", x, |k| k.mul_backward(group_index, grad, x, y))
    }

    // ===== Adjoint =====

    /// Adjoint action `Ad(X) a`
    pub fn adj(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(a, "a")?;
        self.forward("adj", x, x, |k| k.adj_forward(group_index, x, a))
    }

    /// Gradient of [`Dispatcher::adj`]: `[dX, da]`
    pub fn adj_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(a, "a")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("adj_backward", x, |k| k.adj_backward(group_index, grad, x, a))
    }

    /// Transposed adjoint `Ad(X)ᵀ a` (exported as `adjT`)
    pub fn adj_t(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(a, "a")?;
        self.forward("adjT", x, x, |k| k.adjt_forward(group_index, x, a))
    }

    /// Gradient of [`Dispatcher::adj_t`]: `[dX, da]`
    pub fn adj_t_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        a: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(a, "a")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("adjT_backward", x, |k| k.adjt_backward(group_index, grad, x, a))
    }

    // ===== Action on points =====

    /// Action on 3D points, `p: [..., 3]`
    pub fn act(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(p, "p")?;
        self.forward("act", x, x, |k| k.act_forward(group_index, x, p))
    }

    /// Gradient of [`Dispatcher::act`]: `[dX, dp]`
    pub fn act_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(p, "p")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("act_backward", x, |k| k.act_backward(group_index, grad, x, p))
    }

    /// Action on homogeneous points, `p: [..., 4]`
    pub fn act4(&self, group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(p, "p")?;
        self.forward("act4", x, x, |k| k.act4_forward(group_index, x, p))
    }

    /// Gradient of [`Dispatcher::act4`]: `[dX, dp]`
    pub fn act4_backward(
        &self,
        group_index: i32,
        grad: &Tensor,
        x: &Tensor,
        p: &Tensor,
    ) -> Result<Vec<Tensor>> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(p, "p")?;
        ensure_contiguous(grad, "grad")?;
        self.backward("act4_backward", x, |k| k.act4_backward(group_index, grad, x, p))
    }

    // ===== Without gradient =====

    /// Homogeneous `4 x 4` matrices, `[..., 4, 4]`
    pub fn as_matrix(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        self.forward("as_matrix", x, x, |k| k.as_matrix_forward(group_index, x))
    }

    /// Tangent projectors of the embedding, `[..., N, N]`
    pub fn projector(&self, group_index: i32, x: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        self.forward("projector", x, x, |k| k.orthogonal_projector(group_index, x))
    }

    /// Inverse left Jacobian at `log X` applied to `a` (exported as `Jinv`)
    ///
    /// On an unmatched device this returns `a`, not `X`.
    pub fn jinv(&self, group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
        ensure_contiguous(x, "X")?;
        ensure_contiguous(a, "a")?;
        self.forward("Jinv", x, a, |k| k.jleft_forward(group_index, x, a))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Dispatcher");
        s.field("cpu", &self.cpu.as_ref().map(|k| k.name()));
        #[cfg(feature = "cuda")]
        s.field("cuda", &self.cuda.as_ref().map(|k| k.name()));
        s.field("config", &self.config).finish()
    }
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    cpu: Option<Arc<dyn LieKernels>>,
    #[cfg(feature = "cuda")]
    cuda: Option<Arc<dyn LieKernels>>,
    config: DispatchConfig,
}

impl DispatcherBuilder {
    fn new() -> Self {
        #[cfg(feature = "cpu")]
        let cpu: Option<Arc<dyn LieKernels>> = Some(Arc::new(CpuKernels::new()));
        #[cfg(not(feature = "cpu"))]
        let cpu: Option<Arc<dyn LieKernels>> = None;

        Self {
            cpu,
            #[cfg(feature = "cuda")]
            cuda: None,
            config: DispatchConfig::default(),
        }
    }

    /// Serve host tensors with `kernels` instead of the default provider
    pub fn cpu_kernels(mut self, kernels: Arc<dyn LieKernels>) -> Self {
        self.cpu = Some(kernels);
        self
    }

    /// Leave host tensors without a provider
    pub fn without_cpu_kernels(mut self) -> Self {
        self.cpu = None;
        self
    }

    /// Serve CUDA tensors with `kernels`
    #[cfg(feature = "cuda")]
    pub fn cuda_kernels(mut self, kernels: Arc<dyn LieKernels>) -> Self {
        self.cuda = Some(kernels);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the unmatched-device policy
    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.config = self.config.with_fallback(fallback);
        self
    }

    /// Finish building
    pub fn build(self) -> Dispatcher {
        debug!(
            "dispatcher: cpu={:?} fallback={:?}",
            self.cpu.as_ref().map(|k| k.name()),
            self.config.fallback()
        );
        #[cfg(feature = "cuda")]
        debug!("dispatcher: cuda={:?}", self.cuda.as_ref().map(|k| k.name()));

        Dispatcher {
            cpu: self.cpu,
            #[cfg(feature = "cuda")]
            cuda: self.cuda,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;

    #[test]
    fn test_dispatcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }

    #[test]
    #[cfg(feature = "cpu")]
    fn test_provider_selection() {
        let d = Dispatcher::new();
        assert_eq!(d.provider_for(&Device::cpu()).map(|k| k.name()), Some("cpu"));
        assert!(d.provider_for(&Device::meta()).is_none());
        assert!(d.provider_for(&Device::wgpu(0)).is_none());
        #[cfg(feature = "cuda")]
        assert!(d.provider_for(&Device::cuda(0)).is_none());
    }

    #[test]
    fn test_contiguity_reported_first() {
        let d = Dispatcher::new();
        let x = Tensor::from_slice(&[0.0f64; 8], &[2, 4]).transpose(0, 1).unwrap();
        match d.logm(1, &x) {
            Err(Error::NotContiguous { arg }) => assert_eq!(arg, "X"),
            other => panic!("expected NotContiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_passthrough_and_strict_policies() {
        let x = Tensor::meta(&[3, 7], DType::F32);

        let lenient = Dispatcher::new();
        assert!(lenient.inv(2, &x).unwrap().same_data(&x));

        let strict = Dispatcher::builder().fallback(FallbackPolicy::Error).build();
        assert!(matches!(
            strict.inv(2, &x),
            Err(Error::UnsupportedDevice { op: "inv", .. })
        ));
    }

    #[test]
    fn test_without_cpu_kernels_passes_host_tensors_through() {
        let d = Dispatcher::builder().without_cpu_kernels().build();
        let x = Tensor::from_slice(&[0.0f64, 0.0, 0.0, 1.0], &[1, 4]);
        assert!(d.as_matrix(1, &x).unwrap().same_data(&x));
        assert!(d.inv_backward(1, &x, &x).unwrap().is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(Dispatcher::global(), Dispatcher::global()));
        assert_eq!(Dispatcher::global().config().fallback(), FallbackPolicy::Passthrough);
    }
}
