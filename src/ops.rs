//! Exported operations on the process-wide dispatcher
//!
//! Each function forwards to [`Dispatcher::global`]. Names match the exported
//! operation table, including `adjT`, `adjT_backward` and `Jinv`.
//!
//! ```
//! use lietensor::ops;
//! use lietensor::tensor::Tensor;
//!
//! // SE3: translate by (1, 2, 3)
//! let x = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0], &[1, 7]);
//! let p = Tensor::from_slice(&[0.0f64, 0.0, 0.0], &[1, 3]);
//! let q = ops::act(2, &x, &p)?;
//! assert_eq!(q.to_vec::<f64>(), vec![1.0, 2.0, 3.0]);
//! # Ok::<(), lietensor::error::Error>(())
//! ```

#![allow(non_snake_case)]

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::tensor::Tensor;

/// exp map forward
pub fn expm(group_index: i32, a: &Tensor) -> Result<Tensor> {
    Dispatcher::global().expm(group_index, a)
}

/// exp map backward
pub fn expm_backward(group_index: i32, grad: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
    Dispatcher::global().expm_backward(group_index, grad, a)
}

/// log map forward
pub fn logm(group_index: i32, x: &Tensor) -> Result<Tensor> {
    Dispatcher::global().logm(group_index, x)
}

/// log map backward
pub fn logm_backward(group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
    Dispatcher::global().logm_backward(group_index, grad, x)
}

/// inverse operator
pub fn inv(group_index: i32, x: &Tensor) -> Result<Tensor> {
    Dispatcher::global().inv(group_index, x)
}

/// inverse operator backward
pub fn inv_backward(group_index: i32, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
    Dispatcher::global().inv_backward(group_index, grad, x)
}

/// group operator
pub fn mul(group_index: i32, x: &Tensor, y: &Tensor) -> Result<Tensor> {
    Dispatcher::global().mul(group_index, x, y)
}

/// group operator backward
pub fn mul_backward(
    group_index: i32,
    grad: &Tensor,
    x: &Tensor,
    y: &Tensor,
) -> Result<Vec<Tensor>> {
    Dispatcher::global().mul_backward(group_index, grad, x, y)
}

/// adjoint operator
pub fn adj(group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
    Dispatcher::global().adj(group_index, x, a)
}

/// adjoint operator backward
pub fn adj_backward(
    group_index: i32,
    grad: &Tensor,
    x: &Tensor,
    a: &Tensor,
) -> Result<Vec<Tensor>> {
    Dispatcher::global().adj_backward(group_index, grad, x, a)
}

/// transposed adjoint operator
pub fn adjT(group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
    Dispatcher::global().adj_t(group_index, x, a)
}

/// transposed adjoint operator backward
pub fn adjT_backward(
    group_index: i32,
    grad: &Tensor,
    x: &Tensor,
    a: &Tensor,
) -> Result<Vec<Tensor>> {
    Dispatcher::global().adj_t_backward(group_index, grad, x, a)
}

/// action on point
pub fn act(group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
    Dispatcher::global().act(group_index, x, p)
}

/// action on point backward
pub fn act_backward(
    group_index: i32,
    grad: &Tensor,
    x: &Tensor,
    p: &Tensor,
) -> Result<Vec<Tensor>> {
    Dispatcher::global().act_backward(group_index, grad, x, p)
}

/// action on homogeneous point
pub fn act4(group_index: i32, x: &Tensor, p: &Tensor) -> Result<Tensor> {
    Dispatcher::global().act4(group_index, x, p)
}

/// action on homogeneous point backward
pub fn act4_backward(
    group_index: i32,
    grad: &Tensor,
    x: &Tensor,
    p: &Tensor,
) -> Result<Vec<Tensor>> {
    Dispatcher::global().act4_backward(group_index, grad, x, p)
}

/// convert to matrix
pub fn as_matrix(group_index: i32, x: &Tensor) -> Result<Tensor> {
    Dispatcher::global().as_matrix(group_index, x)
}

/// orthogonal projection matrix
pub fn projector(group_index: i32, x: &Tensor) -> Result<Tensor> {
    Dispatcher::global().projector(group_index, x)
}

/// left inverse jacobian operator
pub fn Jinv(group_index: i32, x: &Tensor, a: &Tensor) -> Result<Tensor> {
    Dispatcher::global().jinv(group_index, x, a)
}
