//! Sim3: similarity transforms as `[t; q; s]`

use super::linalg::{
    dyn3, fixed3, homogeneous, inverse_or_nan, phi, put3, quaternion_projector, skew,
};
use super::{GroupId, LieGroup, So3};
use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Vector3};

/// A similarity transform `p ↦ s R p + t`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sim3 {
    rotation: So3,
    translation: Vector3<f64>,
    scale: f64,
}

impl Sim3 {
    /// Build from parts
    pub fn new(rotation: So3, translation: Vector3<f64>, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Rotation part
    pub fn rotation(&self) -> &So3 {
        &self.rotation
    }

    /// Translation part
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Scale factor
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Split a tangent vector into `(ρ, φ, σ)`
#[inline]
fn split(a: &DVector<f64>) -> (Vector3<f64>, Vector3<f64>, f64) {
    (
        Vector3::new(a[0], a[1], a[2]),
        Vector3::new(a[3], a[4], a[5]),
        a[6],
    )
}

/// `W(φ, σ) = Σ (φ^ + σI)^k / (k+1)!`, maps ρ to the translation of `exp`
fn translation_jacobian(phi_vec: &Vector3<f64>, sigma: f64) -> DMatrix<f64> {
    phi(&dyn3(&(skew(phi_vec) + Matrix3::identity() * sigma)))
}

impl LieGroup for Sim3 {
    const ID: GroupId = GroupId::Sim3;
    const N: usize = 8;
    const K: usize = 7;

    fn from_slice(x: &[f64]) -> Self {
        Self::new(
            So3::from_slice(&x[3..7]),
            Vector3::new(x[0], x[1], x[2]),
            x[7],
        )
    }

    fn write_to(&self, out: &mut [f64]) {
        out[..3].copy_from_slice(self.translation.as_slice());
        self.rotation.write_to(&mut out[3..7]);
        out[7] = self.scale;
    }

    fn identity() -> Self {
        Self::new(So3::identity(), Vector3::zeros(), 1.0)
    }

    fn exp(a: &DVector<f64>) -> Self {
        let (rho, phi_vec, sigma) = split(a);
        let w = fixed3(&translation_jacobian(&phi_vec, sigma));
        Self::new(So3::exp_vec(&phi_vec), w * rho, sigma.exp())
    }

    fn log(&self) -> DVector<f64> {
        let sigma = self.scale.ln();
        let phi_vec = self.rotation.log_vec();
        let w_inv = fixed3(&inverse_or_nan(translation_jacobian(&phi_vec, sigma)));
        let rho = w_inv * self.translation;

        let mut a = DVector::zeros(7);
        a.rows_mut(0, 3).copy_from(&rho);
        a.rows_mut(3, 3).copy_from(&phi_vec);
        a[6] = sigma;
        a
    }

    fn inverse(&self) -> Self {
        let r_inv = self.rotation.inverse();
        let s_inv = 1.0 / self.scale;
        let t = -r_inv.rotate(&self.translation) * s_inv;
        Self::new(r_inv, t, s_inv)
    }

    fn compose(&self, rhs: &Self) -> Self {
        Self::new(
            self.rotation.compose(&rhs.rotation),
            self.translation + self.rotation.rotate(&rhs.translation) * self.scale,
            self.scale * rhs.scale,
        )
    }

    fn adjoint(&self) -> DMatrix<f64> {
        let r = self.rotation.rotation_matrix();
        let t = &self.translation;
        let mut m = DMatrix::zeros(7, 7);
        put3(&mut m, 0, 0, &(r * self.scale));
        put3(&mut m, 0, 3, &(skew(t) * r));
        put3(&mut m, 3, 3, &r);
        for i in 0..3 {
            m[(i, 6)] = -t[i];
        }
        m[(6, 6)] = 1.0;
        m
    }

    fn ad(a: &DVector<f64>) -> DMatrix<f64> {
        let (rho, phi_vec, sigma) = split(a);
        let phi_hat = skew(&phi_vec);
        let mut m = DMatrix::zeros(7, 7);
        put3(&mut m, 0, 0, &(phi_hat + Matrix3::identity() * sigma));
        put3(&mut m, 0, 3, &skew(&rho));
        put3(&mut m, 3, 3, &phi_hat);
        for i in 0..3 {
            m[(i, 6)] = -rho[i];
        }
        m
    }

    fn hat(a: &DVector<f64>) -> Matrix4<f64> {
        let (rho, phi_vec, sigma) = split(a);
        let mut m = homogeneous(&(skew(&phi_vec) + Matrix3::identity() * sigma), &rho);
        m[(3, 3)] = 0.0;
        m
    }

    fn matrix(&self) -> Matrix4<f64> {
        homogeneous(
            &(self.rotation.rotation_matrix() * self.scale),
            &self.translation,
        )
    }

    fn projector(&self) -> DMatrix<f64> {
        let mut p = DMatrix::zeros(8, 8);
        for i in 0..3 {
            p[(i, i)] = 1.0;
        }
        let mut q = [0.0; 4];
        self.rotation.write_to(&mut q);
        quaternion_projector(&mut p, 3, &q);
        p[(7, 7)] = 1.0;
        p
    }

    fn act(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.rotate(p) * self.scale + self.translation
    }
}
