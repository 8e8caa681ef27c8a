//! Tensor types
//!
//! This module provides the `Tensor` type, an n-dimensional array tagged with
//! the device its data lives on. It plays the part of the host numeric
//! framework: group operations only read its contiguity and device tag, and
//! the CPU kernels read its data.

mod core;
mod id;
mod layout;
mod storage;

pub use core::Tensor;
pub use id::TensorId;
pub use layout::{Layout, Shape, Strides};
pub use storage::Storage;
