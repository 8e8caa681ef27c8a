//! # lietensor
//!
//! **Lie group operations over tensors, dispatched to per-device kernels.**
//!
//! lietensor exposes the exponential and logarithm maps, inverse, product,
//! adjoint, point action and their gradients for three 3D Lie groups, all
//! selected at runtime by an integer index:
//!
//! - `1`: SO3, rotations
//! - `2`: SE3, rigid motions
//! - `3`: Sim3, similarity transforms
//!
//! Each operation is a thin dispatch step. The tensor arguments are checked
//! for contiguity, a kernel provider is chosen from the device the primary
//! tensor lives on, and the call is forwarded unchanged. Host tensors are
//! served by the built-in [`kernel::CpuKernels`]; providers for other devices
//! are injected by the embedding application.
//!
//! ## Quick Start
//!
//! ```
//! use lietensor::prelude::*;
//!
//! // A quarter turn about z, as an SO3 tangent vector
//! let a = Tensor::from_slice(&[0.0f64, 0.0, std::f64::consts::FRAC_PI_2], &[1, 3]);
//! let x = ops::expm(1, &a)?;
//!
//! let p = Tensor::from_slice(&[1.0f64, 0.0, 0.0], &[1, 3]);
//! let q = ops::act(1, &x, &p)?.to_vec::<f64>();
//! assert!((q[1] - 1.0).abs() < 1e-12);
//! # Ok::<(), lietensor::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): register the host kernel provider by default
//! - `rayon` (default): split large batches across threads
//! - `f16`: half-precision dtypes (F16, BF16)
//! - `cuda`: a provider slot for CUDA tensors, filled by the caller

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod dtype;
pub mod error;
pub mod group;
pub mod kernel;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatch::{DispatchConfig, Dispatcher, FallbackPolicy};
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::group::{GroupId, LieGroup};
    pub use crate::kernel::LieKernels;
    pub use crate::ops;
    pub use crate::runtime::{Device, DeviceType};
    pub use crate::tensor::{Layout, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::kernel::CpuKernels;
}
