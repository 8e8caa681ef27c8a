//! Error types for lietensor

use crate::dtype::DType;
use crate::runtime::Device;
use thiserror::Error;

/// Result type alias using lietensor's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lietensor operations
#[derive(Error, Debug)]
pub enum Error {
    /// Tensor argument is not contiguous in memory
    ///
    /// This is the only error the dispatcher raises on its own. It is reported
    /// before any kernel runs.
    #[error("{arg} must be contiguous")]
    NotContiguous {
        /// Name of the offending argument (`X`, `Y`, `a`, `p`, `grad`)
        arg: &'static str,
    },

    /// Group index does not name a supported Lie group
    #[error("Invalid group index {0}: expected 1 (SO3), 2 (SE3) or 3 (Sim3)")]
    InvalidGroup(i32),

    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Tensor lives on a device the kernel cannot read
    #[error("Device mismatch: kernel '{kernel}' cannot operate on {device}")]
    DeviceMismatch {
        /// Provider name
        kernel: &'static str,
        /// Device of the rejected tensor
        device: Device,
    },

    /// No kernel provider is registered for the tensor's device
    ///
    /// Only raised when the dispatcher runs with `FallbackPolicy::Error`.
    #[error("No kernel provider for device {device} in operation '{op}'")]
    UnsupportedDevice {
        /// Device of the primary tensor
        device: Device,
        /// The operation name
        op: &'static str,
    },

    /// Operation name is not registered
    #[error("Unknown operation '{0}'")]
    UnknownOp(String),

    /// Wrong number of tensor arguments for a registered operation
    #[error("Operation '{op}' takes {expected} tensor arguments, got {got}")]
    ArityMismatch {
        /// The operation name
        op: &'static str,
        /// Number of tensors the operation takes
        expected: usize,
        /// Number of tensors supplied
        got: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
