//! SO3: rotations as unit quaternions

use super::linalg::{dyn3, homogeneous, quaternion_projector, skew};
use super::{GroupId, LieGroup};
use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Quaternion, UnitQuaternion, Vector3};

/// Below this squared angle the closed forms switch to their Taylor series
const SMALL_ANGLE_SQ: f64 = 1e-10;

/// A 3D rotation stored as a quaternion `[qx, qy, qz, qw]`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct So3 {
    q: UnitQuaternion<f64>,
}

impl So3 {
    /// Wrap a quaternion as-is
    pub fn from_quaternion(q: UnitQuaternion<f64>) -> Self {
        Self { q }
    }

    /// The underlying quaternion
    pub fn quaternion(&self) -> &UnitQuaternion<f64> {
        &self.q
    }

    /// Rotation matrix `R`
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.q.to_rotation_matrix().into_inner()
    }

    /// `R v`
    #[inline]
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.q.transform_vector(v)
    }

    /// Exponential of a rotation vector
    pub fn exp_vec(phi: &Vector3<f64>) -> Self {
        let theta_sq = phi.norm_squared();
        let (imag, real) = if theta_sq < SMALL_ANGLE_SQ {
            (0.5 - theta_sq / 48.0, 1.0 - theta_sq / 8.0)
        } else {
            let theta = theta_sq.sqrt();
            ((0.5 * theta).sin() / theta, (0.5 * theta).cos())
        };

        let v = phi * imag;
        Self::from_quaternion(UnitQuaternion::new_unchecked(Quaternion::new(
            real, v.x, v.y, v.z,
        )))
    }

    /// Rotation vector of this element, with angle in `[0, π]`
    pub fn log_vec(&self) -> Vector3<f64> {
        let q = self.q.quaternion();
        let mut v = q.imag();
        let mut w = q.w;
        if w < 0.0 {
            v = -v;
            w = -w;
        }

        let n_sq = v.norm_squared();
        let scale = if n_sq < SMALL_ANGLE_SQ {
            2.0 / w - (2.0 / 3.0) * n_sq / (w * w * w)
        } else {
            let n = n_sq.sqrt();
            2.0 * n.atan2(w) / n
        };
        v * scale
    }

    /// Closed-form left Jacobian `Jl(φ)`
    pub fn left_jacobian_of(phi: &Vector3<f64>) -> Matrix3<f64> {
        let theta_sq = phi.norm_squared();
        let k = skew(phi);
        let k2 = k * k;

        let (c1, c2) = if theta_sq < SMALL_ANGLE_SQ {
            (0.5, 1.0 / 6.0)
        } else {
            let theta = theta_sq.sqrt();
            (
                (1.0 - theta.cos()) / theta_sq,
                (theta - theta.sin()) / (theta_sq * theta),
            )
        };
        Matrix3::identity() + k * c1 + k2 * c2
    }

    /// Closed-form `Jl(φ)⁻¹`
    pub fn left_jacobian_inverse_of(phi: &Vector3<f64>) -> Matrix3<f64> {
        let theta_sq = phi.norm_squared();
        let k = skew(phi);
        let k2 = k * k;

        let c2 = if theta_sq < SMALL_ANGLE_SQ {
            1.0 / 12.0
        } else {
            let theta = theta_sq.sqrt();
            let half = 0.5 * theta;
            (1.0 - half / half.tan()) / theta_sq
        };
        Matrix3::identity() - k * 0.5 + k2 * c2
    }

    fn coords(&self) -> [f64; 4] {
        let q = self.q.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl LieGroup for So3 {
    const ID: GroupId = GroupId::So3;
    const N: usize = 4;
    const K: usize = 3;

    fn from_slice(x: &[f64]) -> Self {
        Self::from_quaternion(UnitQuaternion::new_unchecked(Quaternion::new(
            x[3], x[0], x[1], x[2],
        )))
    }

    fn write_to(&self, out: &mut [f64]) {
        out[..4].copy_from_slice(&self.coords());
    }

    fn identity() -> Self {
        Self::from_quaternion(UnitQuaternion::identity())
    }

    fn exp(a: &DVector<f64>) -> Self {
        Self::exp_vec(&Vector3::new(a[0], a[1], a[2]))
    }

    fn log(&self) -> DVector<f64> {
        DVector::from_column_slice(self.log_vec().as_slice())
    }

    fn inverse(&self) -> Self {
        Self::from_quaternion(self.q.inverse())
    }

    fn compose(&self, rhs: &Self) -> Self {
        Self::from_quaternion(self.q * rhs.q)
    }

    fn adjoint(&self) -> DMatrix<f64> {
        dyn3(&self.rotation_matrix())
    }

    fn ad(a: &DVector<f64>) -> DMatrix<f64> {
        dyn3(&skew(&Vector3::new(a[0], a[1], a[2])))
    }

    fn hat(a: &DVector<f64>) -> Matrix4<f64> {
        let mut m = homogeneous(&skew(&Vector3::new(a[0], a[1], a[2])), &Vector3::zeros());
        m[(3, 3)] = 0.0;
        m
    }

    fn matrix(&self) -> Matrix4<f64> {
        homogeneous(&self.rotation_matrix(), &Vector3::zeros())
    }

    fn projector(&self) -> DMatrix<f64> {
        let mut p = DMatrix::zeros(4, 4);
        quaternion_projector(&mut p, 0, &self.coords());
        p
    }

    fn act(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotate(p)
    }

    fn left_jacobian(a: &DVector<f64>) -> DMatrix<f64> {
        dyn3(&Self::left_jacobian_of(&Vector3::new(a[0], a[1], a[2])))
    }

    fn left_jacobian_inverse(a: &DVector<f64>) -> DMatrix<f64> {
        dyn3(&Self::left_jacobian_inverse_of(&Vector3::new(a[0], a[1], a[2])))
    }
}
