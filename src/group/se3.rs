//! SE3: rigid motions as `[t; q]`

use super::linalg::{homogeneous, put3, quaternion_projector, skew};
use super::{GroupId, LieGroup, So3};
use nalgebra::{DMatrix, DVector, Matrix4, Vector3};

/// A rigid motion `p ↦ R p + t`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Se3 {
    rotation: So3,
    translation: Vector3<f64>,
}

impl Se3 {
    /// Build from parts
    pub fn new(rotation: So3, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
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
}

/// Split a tangent vector into `(ρ, φ)`
#[inline]
fn split(a: &DVector<f64>) -> (Vector3<f64>, Vector3<f64>) {
    (
        Vector3::new(a[0], a[1], a[2]),
        Vector3::new(a[3], a[4], a[5]),
    )
}

impl LieGroup for Se3 {
    const ID: GroupId = GroupId::Se3;
    const N: usize = 7;
    const K: usize = 6;

    fn from_slice(x: &[f64]) -> Self {
        Self::new(
            So3::from_slice(&x[3..7]),
            Vector3::new(x[0], x[1], x[2]),
        )
    }

    fn write_to(&self, out: &mut [f64]) {
        out[..3].copy_from_slice(self.translation.as_slice());
        self.rotation.write_to(&mut out[3..7]);
    }

    fn identity() -> Self {
        Self::new(So3::identity(), Vector3::zeros())
    }

    fn exp(a: &DVector<f64>) -> Self {
        let (rho, phi) = split(a);
        Self::new(So3::exp_vec(&phi), So3::left_jacobian_of(&phi) * rho)
    }

    fn log(&self) -> DVector<f64> {
        let phi = self.rotation.log_vec();
        let rho = So3::left_jacobian_inverse_of(&phi) * self.translation;
        DVector::from_iterator(6, rho.iter().chain(phi.iter()).copied())
    }

    fn inverse(&self) -> Self {
        let r_inv = self.rotation.inverse();
        let t = -r_inv.rotate(&self.translation);
        Self::new(r_inv, t)
    }

    fn compose(&self, rhs: &Self) -> Self {
        Self::new(
            self.rotation.compose(&rhs.rotation),
            self.translation + self.rotation.rotate(&rhs.translation),
        )
    }

    fn adjoint(&self) -> DMatrix<f64> {
        let r = self.rotation.rotation_matrix();
        let mut m = DMatrix::zeros(6, 6);
        put3(&mut m, 0, 0, &r);
        put3(&mut m, 0, 3, &(skew(&self.translation) * r));
        put3(&mut m, 3, 3, &r);
        m
    }

    fn ad(a: &DVector<f64>) -> DMatrix<f64> {
        let (rho, phi) = split(a);
        let phi_hat = skew(&phi);
        let mut m = DMatrix::zeros(6, 6);
        put3(&mut m, 0, 0, &phi_hat);
        put3(&mut m, 0, 3, &skew(&rho));
        put3(&mut m, 3, 3, &phi_hat);
        m
    }

    fn hat(a: &DVector<f64>) -> Matrix4<f64> {
        let (rho, phi) = split(a);
        let mut m = homogeneous(&skew(&phi), &rho);
        m[(3, 3)] = 0.0;
        m
    }

    fn matrix(&self) -> Matrix4<f64> {
        homogeneous(&self.rotation.rotation_matrix(), &self.translation)
    }

    fn projector(&self) -> DMatrix<f64> {
        let mut p = DMatrix::zeros(7, 7);
        for i in 0..3 {
            p[(i, i)] = 1.0;
        }
        let mut q = [0.0; 4];
        self.rotation.write_to(&mut q);
        quaternion_projector(&mut p, 3, &q);
        p
    }

    fn act(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.rotate(p) + self.translation
    }
}
