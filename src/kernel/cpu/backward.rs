//! Backward kernels
//!
//! Gradients are left-tangent covectors. A gradient for a group-valued
//! output may arrive with width N or K; only its first K entries are read.
//! Gradients returned for group inputs have the input's N-wide shape with
//! zeros after entry K.

use super::batch::{to_tensor, Rows};
use super::rows::{put_vector, vector};
use super::CpuKernels;
use crate::error::Result;
use crate::group::LieGroup;
use crate::tensor::Tensor;
use nalgebra::{DVector, Vector3, Vector4};

/// Read a gradient of a group-valued output
fn group_grad<G: LieGroup>(grad: &Tensor, primary: &Rows) -> Result<Rows> {
    let grad = Rows::read_any(grad, &[G::N, G::K])?;
    primary.expect_same_batch(&grad)?;
    Ok(grad)
}

/// Read a gradient whose width is fixed
fn fixed_grad(grad: &Tensor, width: usize, primary: &Rows) -> Result<Rows> {
    let grad = Rows::read(grad, width)?;
    primary.expect_same_batch(&grad)?;
    Ok(grad)
}

#[inline]
fn covector<G: LieGroup>(grad: &Rows, i: usize) -> DVector<f64> {
    vector(&grad.row(i)[..G::K])
}

pub(super) fn exp<G: LieGroup>(k: &CpuKernels, grad: &Tensor, a: &Tensor) -> Result<Vec<Tensor>> {
    let a = Rows::read(a, G::K)?;
    let grad = group_grad::<G>(grad, &a)?;

    let da = k.map_rows(a.batch(), G::K, |i, out| {
        let jl = G::left_jacobian(&vector(a.row(i)));
        put_vector(out, &(jl.transpose() * covector::<G>(&grad, i)))
    });
    Ok(vec![to_tensor(&da, &a.shape_with(G::K), a.dtype())?])
}

pub(super) fn log<G: LieGroup>(k: &CpuKernels, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let grad = fixed_grad(grad, G::K, &x)?;

    let dx = k.map_rows(x.batch(), G::N, |i, out| {
        let jinv = G::left_jacobian_inverse(&G::from_slice(x.row(i)).log());
        put_vector(out, &(jinv.transpose() * vector(grad.row(i))))
    });
    Ok(vec![to_tensor(&dx, &x.shape_with(G::N), x.dtype())?])
}

pub(super) fn inv<G: LieGroup>(k: &CpuKernels, grad: &Tensor, x: &Tensor) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let grad = group_grad::<G>(grad, &x)?;

    let dx = k.map_rows(x.batch(), G::N, |i, out| {
        let ad = G::from_slice(x.row(i)).inverse().adjoint();
        put_vector(out, &-(ad.transpose() * covector::<G>(&grad, i)))
    });
    Ok(vec![to_tensor(&dx, &x.shape_with(G::N), x.dtype())?])
}

pub(super) fn mul<G: LieGroup>(
    k: &CpuKernels,
    grad: &Tensor,
    x: &Tensor,
    y: &Tensor,
) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let y = Rows::read(y, G::N)?;
    x.expect_same_batch(&y)?;
    let grad = group_grad::<G>(grad, &x)?;

    let (dx, dy) = k.map_rows2(x.batch(), G::N, G::N, |i, out_x, out_y| {
        let g = covector::<G>(&grad, i);
        let ad = G::from_slice(x.row(i)).adjoint();
        put_vector(out_y, &(ad.transpose() * &g));
        put_vector(out_x, &g);
    });
    Ok(vec![
        to_tensor(&dx, &x.shape_with(G::N), x.dtype())?,
        to_tensor(&dy, &y.shape_with(G::N), y.dtype())?,
    ])
}

pub(super) fn adj<G: LieGroup>(
    k: &CpuKernels,
    grad: &Tensor,
    x: &Tensor,
    a: &Tensor,
) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let a = Rows::read(a, G::K)?;
    x.expect_same_batch(&a)?;
    let grad = fixed_grad(grad, G::K, &x)?;

    let (dx, da) = k.map_rows2(x.batch(), G::N, G::K, |i, out_x, out_a| {
        let g = vector(grad.row(i));
        let ad = G::from_slice(x.row(i)).adjoint();
        let b = &ad * vector(a.row(i));
        put_vector(out_a, &(ad.transpose() * &g));
        put_vector(out_x, &-(G::ad(&b).transpose() * &g));
    });
    Ok(vec![
        to_tensor(&dx, &x.shape_with(G::N), x.dtype())?,
        to_tensor(&da, &a.shape_with(G::K), a.dtype())?,
    ])
}

pub(super) fn adjt<G: LieGroup>(
    k: &CpuKernels,
    grad: &Tensor,
    x: &Tensor,
    a: &Tensor,
) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let a = Rows::read(a, G::K)?;
    x.expect_same_batch(&a)?;
    let grad = fixed_grad(grad, G::K, &x)?;

    let (dx, da) = k.map_rows2(x.batch(), G::N, G::K, |i, out_x, out_a| {
        let v = G::from_slice(x.row(i)).adjoint() * vector(grad.row(i));
        put_vector(out_x, &-(G::ad(&v).transpose() * vector(a.row(i))));
        put_vector(out_a, &v);
    });
    Ok(vec![
        to_tensor(&dx, &x.shape_with(G::N), x.dtype())?,
        to_tensor(&da, &a.shape_with(G::K), a.dtype())?,
    ])
}

pub(super) fn act<G: LieGroup>(
    k: &CpuKernels,
    grad: &Tensor,
    x: &Tensor,
    p: &Tensor,
) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let p = Rows::read(p, 3)?;
    x.expect_same_batch(&p)?;
    let grad = fixed_grad(grad, 3, &x)?;

    let (dx, dp) = k.map_rows2(x.batch(), G::N, 3, |i, out_x, out_p| {
        let g = Vector3::from_column_slice(grad.row(i));
        let elem = G::from_slice(x.row(i));
        let q = elem.act(&Vector3::from_column_slice(p.row(i)));

        let jac = G::act_jacobian(&q);
        put_vector(out_x, &(jac.transpose() * vector(g.as_slice())));

        let linear = elem.matrix().fixed_view::<3, 3>(0, 0).into_owned();
        out_p.copy_from_slice((linear.transpose() * g).as_slice());
    });
    Ok(vec![
        to_tensor(&dx, &x.shape_with(G::N), x.dtype())?,
        to_tensor(&dp, &p.shape_with(3), p.dtype())?,
    ])
}

pub(super) fn act4<G: LieGroup>(
    k: &CpuKernels,
    grad: &Tensor,
    x: &Tensor,
    p: &Tensor,
) -> Result<Vec<Tensor>> {
    let x = Rows::read(x, G::N)?;
    let p = Rows::read(p, 4)?;
    x.expect_same_batch(&p)?;
    let grad = fixed_grad(grad, 4, &x)?;

    let (dx, dp) = k.map_rows2(x.batch(), G::N, 4, |i, out_x, out_p| {
        let g = Vector4::from_column_slice(grad.row(i));
        let m = G::from_slice(x.row(i)).matrix();
        let q = m * Vector4::from_column_slice(p.row(i));

        let jac = G::act4_jacobian(&q);
        put_vector(out_x, &(jac.transpose() * vector(g.as_slice())));
        out_p.copy_from_slice((m.transpose() * g).as_slice());
    });
    Ok(vec![
        to_tensor(&dx, &x.shape_with(G::N), x.dtype())?,
        to_tensor(&dp, &p.shape_with(4), p.dtype())?,
    ])
}
