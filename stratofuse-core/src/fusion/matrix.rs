//! Fixed-Size Linear Algebra Kernel
//!
//! No-std matrix and vector primitives for the attitude filter. Everything
//! operates on plain arrays owned by the caller: nothing allocates, nothing
//! resizes, and every function except [`invert3x3`] is total.
//!
//! Product-like operations write into a separate `out` argument. The borrow
//! checker already guarantees that `out` cannot alias an input, which is the
//! only precondition the formulas rely on.
//!
//! ```rust
//! use stratofuse_core::fusion::matrix::{invert3x3, multiply, identity, Matrix3};
//!
//! let m: Matrix3 = [[4.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
//! let mut inv = [[0.0; 3]; 3];
//! invert3x3(&m, &mut inv).unwrap();
//!
//! let mut product = [[0.0; 3]; 3];
//! multiply(&m, &inv, &mut product);
//! assert_eq!(product, identity::<3>());
//! ```

use libm::{fabsf, sqrtf};

use crate::constants::fusion::SINGULARITY_THRESHOLD;
use crate::fusion::{FusionError, FusionResult};

/// Column vector of length `N`
pub type Vector<const N: usize> = [f32; N];

/// Row-major `R x C` matrix
pub type Matrix<const R: usize, const C: usize> = [[f32; C]; R];

/// Square `N x N` matrix
pub type SquareMatrix<const N: usize> = Matrix<N, N>;

/// 3-vector
pub type Vector3 = Vector<3>;

/// 3x3 matrix
pub type Matrix3 = SquareMatrix<3>;

/// 4x4 matrix
pub type Matrix4 = SquareMatrix<4>;

// ===== 3-VECTORS =====

/// `a + b`
#[inline]
pub fn add_vectors(a: &Vector3, b: &Vector3) -> Vector3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// `a - b`
#[inline]
pub fn subtract_vectors(a: &Vector3, b: &Vector3) -> Vector3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `s * v`
#[inline]
pub fn scale_vector(s: f32, v: &Vector3) -> Vector3 {
    [s * v[0], s * v[1], s * v[2]]
}

/// `acc += s * v`
#[inline]
pub fn scale_accumulate(acc: &mut Vector3, s: f32, v: &Vector3) {
    acc[0] += s * v[0];
    acc[1] += s * v[1];
    acc[2] += s * v[2];
}

/// Dot product
#[inline]
pub fn dot(a: &Vector3, b: &Vector3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product `a x b`
#[inline]
pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length
#[inline]
pub fn length(v: &Vector3) -> f32 {
    sqrtf(dot(v, v))
}

/// Scale `v` to unit length in place. A zero vector is left untouched.
pub fn normalize(v: &mut Vector3) {
    let len = length(v);
    if len != 0.0 {
        let inv = 1.0 / len;
        v[0] *= inv;
        v[1] *= inv;
        v[2] *= inv;
    }
}

// ===== GENERIC MATRICES =====

/// `N x N` identity
pub fn identity<const N: usize>() -> SquareMatrix<N> {
    let mut m = [[0.0; N]; N];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

/// `out = aᵀ`
pub fn transpose<const R: usize, const C: usize>(a: &Matrix<R, C>, out: &mut Matrix<C, R>) {
    for i in 0..R {
        for j in 0..C {
            out[j][i] = a[i][j];
        }
    }
}

/// `out = a · b`
pub fn multiply<const R: usize, const K: usize, const C: usize>(
    a: &Matrix<R, K>,
    b: &Matrix<K, C>,
    out: &mut Matrix<R, C>,
) {
    for i in 0..R {
        for j in 0..C {
            let mut sum = 0.0;
            for k in 0..K {
                sum += a[i][k] * b[k][j];
            }
            out[i][j] = sum;
        }
    }
}

/// `out = m · v`
pub fn matvec<const R: usize, const C: usize>(
    m: &Matrix<R, C>,
    v: &Vector<C>,
    out: &mut Vector<R>,
) {
    for i in 0..R {
        let mut sum = 0.0;
        for j in 0..C {
            sum += m[i][j] * v[j];
        }
        out[i] = sum;
    }
}

/// `out = a + b`
pub fn add<const R: usize, const C: usize>(
    a: &Matrix<R, C>,
    b: &Matrix<R, C>,
    out: &mut Matrix<R, C>,
) {
    for i in 0..R {
        for j in 0..C {
            out[i][j] = a[i][j] + b[i][j];
        }
    }
}

/// `out = s · a`
pub fn scale<const R: usize, const C: usize>(s: f32, a: &Matrix<R, C>, out: &mut Matrix<R, C>) {
    for i in 0..R {
        for j in 0..C {
            out[i][j] = s * a[i][j];
        }
    }
}

/// Replace `m` with `(m + mᵀ) / 2`
pub fn make_symmetric<const N: usize>(m: &mut SquareMatrix<N>) {
    for i in 0..N {
        for j in (i + 1)..N {
            let avg = 0.5 * (m[i][j] + m[j][i]);
            m[i][j] = avg;
            m[j][i] = avg;
        }
    }
}

// ===== 3x3 SPECIALIZATIONS =====

/// Determinant by cofactor expansion along the first row
pub fn determinant3x3(m: &Matrix3) -> f32 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Adjoint (transposed cofactor matrix), scaled by `s`
pub fn scale_adjoint3x3(s: f32, m: &Matrix3, out: &mut Matrix3) {
    out[0][0] = s * (m[1][1] * m[2][2] - m[1][2] * m[2][1]);
    out[0][1] = s * (m[0][2] * m[2][1] - m[0][1] * m[2][2]);
    out[0][2] = s * (m[0][1] * m[1][2] - m[0][2] * m[1][1]);

    out[1][0] = s * (m[1][2] * m[2][0] - m[1][0] * m[2][2]);
    out[1][1] = s * (m[0][0] * m[2][2] - m[0][2] * m[2][0]);
    out[1][2] = s * (m[0][2] * m[1][0] - m[0][0] * m[1][2]);

    out[2][0] = s * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    out[2][1] = s * (m[0][1] * m[2][0] - m[0][0] * m[2][1]);
    out[2][2] = s * (m[0][0] * m[1][1] - m[0][1] * m[1][0]);
}

/// Adjoint (transposed cofactor matrix)
#[inline]
pub fn adjoint3x3(m: &Matrix3, out: &mut Matrix3) {
    scale_adjoint3x3(1.0, m, out);
}

/// Inverse via `adj(m) / det(m)`
///
/// Fails with [`FusionError::SingularMatrix`] when `|det(m)|` is below
/// [`SINGULARITY_THRESHOLD`]; `out` is not written in that case.
pub fn invert3x3(m: &Matrix3, out: &mut Matrix3) -> FusionResult<()> {
    let determinant = determinant3x3(m);
    if determinant.is_nan() || fabsf(determinant) < SINGULARITY_THRESHOLD {
        return Err(FusionError::SingularMatrix { determinant });
    }
    scale_adjoint3x3(1.0 / determinant, m, out);
    Ok(())
}

/// Skew-symmetric matrix `[v]x` such that `[v]x · w = v x w`
pub fn skew(v: &Vector3) -> Matrix3 {
    [
        [0.0, -v[2], v[1]],
        [v[2], 0.0, -v[0]],
        [-v[1], v[0], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close3(a: &Matrix3, b: &Matrix3, tol: f32) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a[i][j] - b[i][j]).abs() < tol,
                    "[{}][{}]: {} vs {}", i, j, a[i][j], b[i][j]
                );
            }
        }
    }

    #[test]
    fn vector_basics() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];

        assert_eq!(add_vectors(&a, &b), [5.0, 7.0, 9.0]);
        assert_eq!(subtract_vectors(&b, &a), [3.0, 3.0, 3.0]);
        assert_eq!(scale_vector(2.0, &a), [2.0, 4.0, 6.0]);
        assert_eq!(dot(&a, &b), 32.0);
        assert_eq!(cross(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);

        let mut acc = [1.0, 1.0, 1.0];
        scale_accumulate(&mut acc, 0.5, &b);
        assert_eq!(acc, [3.0, 3.5, 4.0]);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut zero = [0.0; 3];
        normalize(&mut zero);
        assert_eq!(zero, [0.0; 3]);

        let mut v = [3.0, 0.0, 4.0];
        normalize(&mut v);
        assert!((length(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn transpose_and_multiply_rectangular() {
        let h: Matrix<2, 3> = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mut ht = [[0.0; 2]; 3];
        transpose(&h, &mut ht);
        assert_eq!(ht, [[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);

        let mut hht = [[0.0; 2]; 2];
        multiply(&h, &ht, &mut hht);
        assert_eq!(hht, [[14.0, 32.0], [32.0, 77.0]]);
    }

    #[test]
    fn matvec_product() {
        let m: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [1.0, 1.0, 1.0]];
        let mut out = [0.0; 3];
        matvec(&m, &[1.0, 2.0, 3.0], &mut out);
        assert_eq!(out, [1.0, 4.0, 6.0]);
    }

    #[test]
    fn determinant_by_cofactors() {
        assert_eq!(determinant3x3(&identity::<3>()), 1.0);
        let m = [[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 1.0]];
        // 2(3-2) - 0 + 1(1-3) = 0
        assert_eq!(determinant3x3(&m), 0.0);
        let m = [[6.0, 1.0, 1.0], [4.0, -2.0, 5.0], [2.0, 8.0, 7.0]];
        assert!((determinant3x3(&m) + 306.0).abs() < 1e-3);
    }

    #[test]
    fn inverse_round_trips_to_identity() {
        let m = [[6.0, 1.0, 1.0], [4.0, -2.0, 5.0], [2.0, 8.0, 7.0]];
        let mut inv = [[0.0; 3]; 3];
        invert3x3(&m, &mut inv).unwrap();

        let mut product = [[0.0; 3]; 3];
        multiply(&m, &inv, &mut product);
        assert_close3(&product, &identity::<3>(), 1e-5);
    }

    #[test]
    fn singular_inverse_leaves_output_untouched() {
        let sentinel = [[7.0; 3]; 3];
        let mut out = sentinel;

        let result = invert3x3(&[[0.0; 3]; 3], &mut out);
        assert!(matches!(result, Err(FusionError::SingularMatrix { .. })));
        assert_eq!(out, sentinel);

        let rank_two = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        assert!(invert3x3(&rank_two, &mut out).is_err());
        assert_eq!(out, sentinel);
    }

    #[test]
    fn adjoint_scales_with_factor() {
        let m = [[1.0, 2.0, 0.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]];
        let mut adj = [[0.0; 3]; 3];
        let mut scaled = [[0.0; 3]; 3];
        adjoint3x3(&m, &mut adj);
        scale_adjoint3x3(2.0, &m, &mut scaled);

        let mut doubled = [[0.0; 3]; 3];
        scale(2.0, &adj, &mut doubled);
        assert_eq!(scaled, doubled);

        // m · adj(m) = det(m) · I
        let mut product = [[0.0; 3]; 3];
        multiply(&m, &adj, &mut product);
        let mut expected = [[0.0; 3]; 3];
        scale(determinant3x3(&m), &identity::<3>(), &mut expected);
        assert_close3(&product, &expected, 1e-5);
    }

    #[test]
    fn skew_matches_cross_product() {
        let v = [0.3, -1.2, 2.0];
        let w = [1.5, 0.5, -0.7];
        let mut out = [0.0; 3];
        matvec(&skew(&v), &w, &mut out);
        let expected = cross(&v, &w);
        for i in 0..3 {
            assert!((out[i] - expected[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn symmetrize_averages_off_diagonal() {
        let mut m = [[1.0, 2.0], [4.0, 3.0]];
        make_symmetric(&mut m);
        assert_eq!(m, [[1.0, 3.0], [3.0, 3.0]]);

        let a = [[1.0, 2.0], [3.0, 4.0]];
        let mut sum = [[0.0; 2]; 2];
        add(&a, &a, &mut sum);
        assert_eq!(sum, [[2.0, 4.0], [6.0, 8.0]]);
    }
}
