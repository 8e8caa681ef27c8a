//! Device identification
//!
//! A [`Device`] is the storage-location tag carried by every tensor. The
//! dispatcher reads it to pick a kernel provider.

use std::fmt;

/// Kind of compute device a buffer lives on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeviceType {
    /// Host memory
    Cpu,
    /// NVIDIA CUDA device memory
    Cuda,
    /// WebGPU buffer
    Wgpu,
    /// Shape-only tensor with no backing data
    Meta,
}

impl DeviceType {
    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Wgpu => "wgpu",
            Self::Meta => "meta",
        }
    }
}

/// A specific device: kind plus ordinal
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Device {
    kind: DeviceType,
    index: usize,
}

impl Device {
    /// The host CPU (there's only one)
    pub const fn cpu() -> Self {
        Self {
            kind: DeviceType::Cpu,
            index: 0,
        }
    }

    /// CUDA device with the given ordinal
    pub const fn cuda(index: usize) -> Self {
        Self {
            kind: DeviceType::Cuda,
            index,
        }
    }

    /// WebGPU adapter with the given ordinal
    pub const fn wgpu(index: usize) -> Self {
        Self {
            kind: DeviceType::Wgpu,
            index,
        }
    }

    /// Meta device (no storage)
    pub const fn meta() -> Self {
        Self {
            kind: DeviceType::Meta,
            index: 0,
        }
    }

    /// Device kind
    #[inline]
    pub const fn kind(&self) -> DeviceType {
        self.kind
    }

    /// Device ordinal within its kind
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Check if this is host memory
    #[inline]
    pub fn is_cpu(&self) -> bool {
        self.kind == DeviceType::Cpu
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceType::Cpu | DeviceType::Meta => f.write_str(self.kind.name()),
            _ => write!(f, "{}:{}", self.kind.name(), self.index),
        }
    }
}
