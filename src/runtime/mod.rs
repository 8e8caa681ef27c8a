//! Device memory for tensor storage
//!
//! ```text
//! Device (storage-location tag: cpu, cuda:N, wgpu:N, meta)
//! └── CpuRuntime (allocates and copies host memory)
//! ```
//!
//! Memory on other devices is owned by an external runtime and only wrapped
//! by [`crate::tensor::Storage`].

pub mod cpu;
mod device;

pub use cpu::CpuRuntime;
pub use device::{Device, DeviceType};
