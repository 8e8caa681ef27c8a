//! Small dense helpers shared by the group implementations

use nalgebra::{DMatrix, Matrix3, Matrix4, Vector3};

/// Taylor terms used after scaling; ‖A/2^s‖ ≤ 0.5 makes the tail negligible
const TAYLOR_TERMS: usize = 20;

/// Upper bound on squarings, keeps non-finite norms from looping forever
const MAX_SQUARINGS: i32 = 64;

/// Cross-product matrix: `skew(v) * w == v.cross(&w)`
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Matrix exponential by scaling and squaring with a truncated Taylor series
pub fn expm(a: &DMatrix<f64>) -> DMatrix<f64> {
    let n = a.nrows();
    let norm = a
        .row_iter()
        .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max);

    if !norm.is_finite() {
        return DMatrix::from_element(n, n, f64::NAN);
    }

    let squarings = if norm > 0.5 {
        ((norm / 0.5).log2().ceil() as i32).clamp(0, MAX_SQUARINGS)
    } else {
        0
    };
    let scaled = a / 2f64.powi(squarings);

    let mut result = DMatrix::<f64>::identity(n, n);
    let mut term = DMatrix::<f64>::identity(n, n);
    for k in 1..=TAYLOR_TERMS {
        term = (&term * &scaled) / (k as f64);
        result += &term;
        if term.amax() <= f64::EPSILON * result.amax() {
            break;
        }
    }

    for _ in 0..squarings {
        result = &result * &result;
    }
    result
}

/// `Σ_k A^k / (k+1)!`, read off the exponential of `[[A, I], [0, 0]]`
///
/// With `A = ad(a)` this is the left Jacobian of the exponential map.
pub fn phi(a: &DMatrix<f64>) -> DMatrix<f64> {
    let n = a.nrows();
    let mut block = DMatrix::<f64>::zeros(2 * n, 2 * n);
    for i in 0..n {
        for j in 0..n {
            block[(i, j)] = a[(i, j)];
        }
        block[(i, n + i)] = 1.0;
    }

    let e = expm(&block);
    DMatrix::from_fn(n, n, |i, j| e[(i, n + j)])
}

/// Inverse, or an all-NaN matrix when singular
pub fn inverse_or_nan(m: DMatrix<f64>) -> DMatrix<f64> {
    let n = m.nrows();
    m.try_inverse()
        .unwrap_or_else(|| DMatrix::from_element(n, n, f64::NAN))
}

/// Copy a 3x3 block into `dst` at (row, col)
#[inline]
pub fn put3(dst: &mut DMatrix<f64>, row: usize, col: usize, src: &Matrix3<f64>) {
    for i in 0..3 {
        for j in 0..3 {
            dst[(row + i, col + j)] = src[(i, j)];
        }
    }
}

/// Widen a 3x3 matrix to a dynamic one
#[inline]
pub fn dyn3(m: &Matrix3<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(3, 3, |i, j| m[(i, j)])
}

/// Narrow the top-left 3x3 block of a dynamic matrix
#[inline]
pub fn fixed3(m: &DMatrix<f64>) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| m[(i, j)])
}

/// Homogeneous 4x4 `[[linear, t], [0, 1]]`
pub fn homogeneous(linear: &Matrix3<f64>, t: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    for i in 0..3 {
        for j in 0..3 {
            m[(i, j)] = linear[(i, j)];
        }
        m[(i, 3)] = t[i];
    }
    m
}

/// Tangent-space projector of the unit quaternion sphere at `q`: `I - q qᵀ`
pub fn quaternion_projector(dst: &mut DMatrix<f64>, at: usize, q: &[f64]) {
    for i in 0..4 {
        for j in 0..4 {
            let eye = if i == j { 1.0 } else { 0.0 };
            dst[(at + i, at + j)] = eye - q[i] * q[j];
        }
    }
}
