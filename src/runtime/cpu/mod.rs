//! CPU runtime implementation
//!
//! The CPU runtime uses aligned heap allocation. Every buffer it hands out is
//! 64-byte aligned so typed views of any supported dtype are valid.

mod runtime;

pub use runtime::CpuRuntime;
