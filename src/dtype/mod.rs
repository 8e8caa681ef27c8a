//! Data type system for lietensor tensors
//!
//! Group kernels compute in f64 internally. The tensor dtype only controls
//! how elements are stored and what dtype results are written back in.

mod element;

pub use element::Element;

use std::fmt;

/// Data types supported by lietensor tensors
///
/// The discriminant values follow numeric precision so that they can be
/// persisted alongside raw buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point (most common)
    F32 = 1,
    /// 16-bit floating point (IEEE 754), requires the `f16` feature
    F16 = 2,
    /// 16-bit brain floating point, requires the `f16` feature
    BF16 = 3,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 => 8,
            Self::F32 => 4,
            Self::F16 | Self::BF16 => 2,
        }
    }

    /// Returns true if storage of this dtype can be created in this build
    #[inline]
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::F64 | Self::F32 => true,
            Self::F16 | Self::BF16 => cfg!(feature = "f16"),
        }
    }

    /// Short name used in error messages and logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dispatch on a runtime dtype with `T` bound to the matching element type
///
/// Half-precision arms are compiled only with the `f16` feature; without it
/// they return `UnsupportedDType`.
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            #[cfg(feature = "f16")]
            $crate::dtype::DType::F16 => {
                type $T = half::f16;
                $body
            }
            #[cfg(feature = "f16")]
            $crate::dtype::DType::BF16 => {
                type $T = half::bf16;
                $body
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err($crate::error::Error::unsupported_dtype(other, $error_op));
            }
        }
    };
}
