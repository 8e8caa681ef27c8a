//! Forward kernels

use super::batch::{to_tensor, Rows};
use super::rows::{put_matrix, put_matrix4, put_vector, vector};
use super::CpuKernels;
use crate::error::Result;
use crate::group::LieGroup;
use crate::tensor::Tensor;
use nalgebra::{Vector3, Vector4};

pub(super) fn exp<G: LieGroup>(k: &CpuKernels, a: &Tensor) -> Result<Tensor> {
    let a = Rows::read(a, G::K)?;
    let out = k.map_rows(a.batch(), G::N, |i, out| {
        G::exp(&vector(a.row(i))).write_to(out)
    });
    to_tensor(&out, &a.shape_with(G::N), a.dtype())
}

pub(super) fn log<G: LieGroup>(k: &CpuKernels, x: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let out = k.map_rows(x.batch(), G::K, |i, out| {
        put_vector(out, &G::from_slice(x.row(i)).log())
    });
    to_tensor(&out, &x.shape_with(G::K), x.dtype())
}

pub(super) fn inv<G: LieGroup>(k: &CpuKernels, x: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let out = k.map_rows(x.batch(), G::N, |i, out| {
        G::from_slice(x.row(i)).inverse().write_to(out)
    });
    to_tensor(&out, &x.shape_with(G::N), x.dtype())
}

pub(super) fn mul<G: LieGroup>(k: &CpuKernels, x: &Tensor, y: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let y = Rows::read(y, G::N)?;
    x.expect_same_batch(&y)?;

    let out = k.map_rows(x.batch(), G::N, |i, out| {
        G::from_slice(x.row(i))
            .compose(&G::from_slice(y.row(i)))
            .write_to(out)
    });
    to_tensor(&out, &x.shape_with(G::N), x.dtype())
}

/// `Ad(X) a`, or `Ad(X)ᵀ a` when `transpose` is set
pub(super) fn adj<G: LieGroup>(
    k: &CpuKernels,
    x: &Tensor,
    a: &Tensor,
    transpose: bool,
) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let a = Rows::read(a, G::K)?;
    x.expect_same_batch(&a)?;

    let out = k.map_rows(x.batch(), G::K, |i, out| {
        let ad = G::from_slice(x.row(i)).adjoint();
        let v = vector(a.row(i));
        if transpose {
            put_vector(out, &(ad.transpose() * v))
        } else {
            put_vector(out, &(ad * v))
        }
    });
    to_tensor(&out, &x.shape_with(G::K), x.dtype())
}

pub(super) fn act<G: LieGroup>(k: &CpuKernels, x: &Tensor, p: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let p = Rows::read(p, 3)?;
    x.expect_same_batch(&p)?;

    let out = k.map_rows(x.batch(), 3, |i, out| {
        let q = G::from_slice(x.row(i)).act(&Vector3::from_column_slice(p.row(i)));
        out.copy_from_slice(q.as_slice())
    });
    to_tensor(&out, &x.shape_with(3), x.dtype())
}

pub(super) fn act4<G: LieGroup>(k: &CpuKernels, x: &Tensor, p: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let p = Rows::read(p, 4)?;
    x.expect_same_batch(&p)?;

    let out = k.map_rows(x.batch(), 4, |i, out| {
        let q = G::from_slice(x.row(i)).act4(&Vector4::from_column_slice(p.row(i)));
        out.copy_from_slice(q.as_slice())
    });
    to_tensor(&out, &x.shape_with(4), x.dtype())
}

pub(super) fn as_matrix<G: LieGroup>(k: &CpuKernels, x: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let out = k.map_rows(x.batch(), 16, |i, out| {
        put_matrix4(out, &G::from_slice(x.row(i)).matrix())
    });
    to_tensor(&out, &x.shape_with_matrix(4, 4), x.dtype())
}

pub(super) fn projector<G: LieGroup>(k: &CpuKernels, x: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let out = k.map_rows(x.batch(), G::N * G::N, |i, out| {
        put_matrix(out, &G::from_slice(x.row(i)).projector())
    });
    to_tensor(&out, &x.shape_with_matrix(G::N, G::N), x.dtype())
}

/// `Jl⁻¹(log X) a`
pub(super) fn jleft_inverse<G: LieGroup>(k: &CpuKernels, x: &Tensor, a: &Tensor) -> Result<Tensor> {
    let x = Rows::read(x, G::N)?;
    let a = Rows::read(a, G::K)?;
    x.expect_same_batch(&a)?;

    let out = k.map_rows(x.batch(), G::K, |i, out| {
        let jinv = G::left_jacobian_inverse(&G::from_slice(x.row(i)).log());
        put_vector(out, &(jinv * vector(a.row(i))))
    });
    to_tensor(&out, &x.shape_with(G::K), x.dtype())
}
