//! Lie groups and their algebra
//!
//! Three matrix Lie groups are supported, selected at runtime by an integer
//! index:
//!
//! | Index | Group  | Embedding (N) | Tangent (K) | Layout                 |
//! |-------|--------|---------------|-------------|------------------------|
//! | 1     | `SO3`  | 4             | 3           | `[qx, qy, qz, qw]`     |
//! | 2     | `SE3`  | 7             | 6           | `[t; q]`               |
//! | 3     | `Sim3` | 8             | 7           | `[t; q; s]`            |
//!
//! Tangent vectors are ordered `[ρ; φ; σ]` (translation, rotation, log-scale),
//! with components a group does not have omitted. Perturbations act on the
//! left: `X ← exp(δ) X`.

mod linalg;
mod se3;
mod sim3;
mod so3;

pub use se3::Se3;
pub use sim3::Sim3;
pub use so3::So3;

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector, Matrix4, Vector3, Vector4};

/// Integer identifier of a supported group
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum GroupId {
    /// 3D rotations
    So3 = 1,
    /// 3D rigid motions
    Se3 = 2,
    /// 3D similarity transforms
    Sim3 = 3,
}

impl GroupId {
    /// All supported groups, in index order
    pub const ALL: [GroupId; 3] = [GroupId::So3, GroupId::Se3, GroupId::Sim3];

    /// Integer index used at the dispatch boundary
    #[inline]
    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Human-readable group name
    pub const fn name(self) -> &'static str {
        match self {
            GroupId::So3 => "SO3",
            GroupId::Se3 => "SE3",
            GroupId::Sim3 => "Sim3",
        }
    }

    /// Width of an embedded group element
    pub const fn embedding_dim(self) -> usize {
        match self {
            GroupId::So3 => So3::N,
            GroupId::Se3 => Se3::N,
            GroupId::Sim3 => Sim3::N,
        }
    }

    /// Width of a tangent vector
    pub const fn tangent_dim(self) -> usize {
        match self {
            GroupId::So3 => So3::K,
            GroupId::Se3 => Se3::K,
            GroupId::Sim3 => Sim3::K,
        }
    }
}

impl TryFrom<i32> for GroupId {
    type Error = Error;

    fn try_from(index: i32) -> Result<Self> {
        match index {
            1 => Ok(GroupId::So3),
            2 => Ok(GroupId::Se3),
            3 => Ok(GroupId::Sim3),
            other => Err(Error::InvalidGroup(other)),
        }
    }
}

impl From<GroupId> for i32 {
    fn from(id: GroupId) -> Self {
        id.index()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A matrix Lie group with an embedded parameterisation
///
/// Implementations never renormalise their quaternion; a non-unit input is
/// carried through every operation as given.
pub trait LieGroup: Sized + Send + Sync {
    /// Runtime identifier of this group
    const ID: GroupId;
    /// Embedding width
    const N: usize;
    /// Tangent width
    const K: usize;

    /// Read an element from its embedding (`x.len() >= N`)
    fn from_slice(x: &[f64]) -> Self;

    /// Write the embedding into `out[..N]`
    fn write_to(&self, out: &mut [f64]);

    /// Identity element
    fn identity() -> Self;

    /// Exponential map from the tangent space
    fn exp(a: &DVector<f64>) -> Self;

    /// Logarithm map to the tangent space
    fn log(&self) -> DVector<f64>;

    /// Group inverse
    fn inverse(&self) -> Self;

    /// Group product `self * rhs`
    fn compose(&self, rhs: &Self) -> Self;

    /// Adjoint representation, `K x K`
    fn adjoint(&self) -> DMatrix<f64>;

    /// Algebra adjoint `ad(a)`, so that `ad(a) b = [a, b]`
    fn ad(a: &DVector<f64>) -> DMatrix<f64>;

    /// Algebra element as a 4x4 matrix
    fn hat(a: &DVector<f64>) -> Matrix4<f64>;

    /// Homogeneous 4x4 matrix of the element
    fn matrix(&self) -> Matrix4<f64>;

    /// Projector onto the tangent space of the embedding, `N x N`
    fn projector(&self) -> DMatrix<f64>;

    /// Action on a 3D point
    fn act(&self, p: &Vector3<f64>) -> Vector3<f64> {
        (self.matrix() * p.push(1.0)).xyz()
    }

    /// Action on a homogeneous point
    fn act4(&self, p: &Vector4<f64>) -> Vector4<f64> {
        self.matrix() * p
    }

    /// Derivative of `exp(δ) q` with respect to `δ` at zero, `4 x K`
    fn act4_jacobian(q: &Vector4<f64>) -> DMatrix<f64> {
        let mut jac = DMatrix::zeros(4, Self::K);
        for i in 0..Self::K {
            let e = DVector::from_fn(Self::K, |j, _| if i == j { 1.0 } else { 0.0 });
            let col = Self::hat(&e) * q;
            for r in 0..4 {
                jac[(r, i)] = col[r];
            }
        }
        jac
    }

    /// Derivative of `exp(δ) p` with respect to `δ` at zero, `3 x K`
    fn act_jacobian(p: &Vector3<f64>) -> DMatrix<f64> {
        Self::act4_jacobian(&p.push(1.0)).rows(0, 3).into_owned()
    }

    /// Left Jacobian of the exponential map at `a`
    fn left_jacobian(a: &DVector<f64>) -> DMatrix<f64> {
        linalg::phi(&Self::ad(a))
    }

    /// Inverse of the left Jacobian; all NaN when singular
    fn left_jacobian_inverse(a: &DVector<f64>) -> DMatrix<f64> {
        linalg::inverse_or_nan(Self::left_jacobian(a))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Property checks shared by the per-group test modules

    use super::linalg::expm;
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    /// Tangent vector with entries in `[-scale, scale)`
    pub fn random_tangent<G: LieGroup>(rng: &mut StdRng, scale: f64) -> DVector<f64> {
        DVector::from_fn(G::K, |_, _| rng.gen_range(-scale..scale))
    }

    pub fn assert_mat_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64, msg: &str) {
        assert_eq!(a.shape(), b.shape(), "{msg}: shape");
        let diff = (a - b).amax();
        assert!(diff < tol, "{msg}: max diff {diff:e}\n{a}\n{b}");
    }

    pub fn assert_vec_close(a: &DVector<f64>, b: &DVector<f64>, tol: f64, msg: &str) {
        assert_eq!(a.len(), b.len(), "{msg}: len");
        let diff = (a - b).amax();
        assert!(diff < tol, "{msg}: max diff {diff:e}\n{a}\n{b}");
    }

    pub fn dyn4(m: &Matrix4<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(4, 4, |i, j| m[(i, j)])
    }

    /// Run the algebraic identities every group must satisfy
    pub fn check_group_laws<G: LieGroup>() {
        let mut rng = rng();
        for _ in 0..20 {
            let a = random_tangent::<G>(&mut rng, 1.0);
            let b = random_tangent::<G>(&mut rng, 1.0);
            let x = G::exp(&a);
            let y = G::exp(&b);

            // log inverts exp
            assert_vec_close(&x.log(), &a, 1e-9, "log(exp(a))");

            // exp agrees with the matrix exponential of hat(a)
            assert_mat_close(
                &dyn4(&x.matrix()),
                &expm(&dyn4(&G::hat(&a))),
                1e-9,
                "exp vs expm(hat)",
            );

            // inverse and composition agree with matrices
            assert_mat_close(
                &dyn4(&x.compose(&x.inverse()).matrix()),
                &DMatrix::identity(4, 4),
                1e-12,
                "X * X^-1",
            );
            assert_mat_close(
                &dyn4(&x.compose(&y).matrix()),
                &dyn4(&(x.matrix() * y.matrix())),
                1e-12,
                "compose vs matmul",
            );

            // hat(Ad(X) b) = M hat(b) M^-1
            let adb = x.adjoint() * &b;
            let m = x.matrix();
            let m_inv = x.inverse().matrix();
            assert_mat_close(
                &dyn4(&G::hat(&adb)),
                &dyn4(&(m * G::hat(&b) * m_inv)),
                1e-12,
                "adjoint",
            );

            // hat(ad(a) b) = [hat(a), hat(b)]
            let ha = G::hat(&a);
            let hb = G::hat(&b);
            let bracket = G::ad(&a) * &b;
            assert_mat_close(
                &dyn4(&G::hat(&bracket)),
                &dyn4(&(ha * hb - hb * ha)),
                1e-12,
                "ad",
            );

            // exp(a + eps b) ~ exp(eps Jl(a) b) exp(a)
            let eps = 1e-6;
            let lhs = G::exp(&(&a + &b * eps));
            let rhs = G::exp(&(G::left_jacobian(&a) * &b * eps)).compose(&x);
            assert_mat_close(
                &dyn4(&lhs.matrix()),
                &dyn4(&rhs.matrix()),
                1e-10,
                "left jacobian",
            );

            assert_mat_close(
                &(G::left_jacobian(&a) * G::left_jacobian_inverse(&a)),
                &DMatrix::identity(G::K, G::K),
                1e-9,
                "Jl * Jl^-1",
            );

            // act agrees with the homogeneous matrix
            let p = Vector3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), 0.5);
            let q = x.act(&p);
            let q4 = x.act4(&p.push(1.0));
            assert!((q - q4.xyz()).norm() < 1e-12);

            // embedding round trip
            let mut buf = vec![0.0; G::N];
            x.write_to(&mut buf);
            let x2 = G::from_slice(&buf);
            assert_mat_close(&dyn4(&x2.matrix()), &dyn4(&m), 1e-15, "embedding");

            // projector is a symmetric idempotent
            let proj = x.projector();
            assert_mat_close(&proj, &proj.transpose(), 1e-15, "projector symmetry");
            assert_mat_close(&(&proj * &proj), &proj, 1e-12, "projector idempotence");
        }
    }

    /// The generic action Jacobian matches a central difference
    pub fn check_act_jacobian<G: LieGroup>() {
        let mut rng = rng();
        let x = G::exp(&random_tangent::<G>(&mut rng, 1.0));
        let p = Vector3::new(0.3, -0.4, 1.2);
        let q = x.act(&p);
        let jac = G::act_jacobian(&q);

        let h = 1e-6;
        for i in 0..G::K {
            let e = DVector::from_fn(G::K, |j, _| if i == j { h } else { 0.0 });
            let plus = G::exp(&e).compose(&x).act(&p);
            let minus = G::exp(&(-e)).compose(&x).act(&p);
            let numeric = (plus - minus) / (2.0 * h);
            for r in 0..3 {
                assert!(
                    (numeric[r] - jac[(r, i)]).abs() < 1e-7,
                    "{}: d act[{r}] / d delta[{i}]",
                    G::ID
                );
            }
        }
    }
}
