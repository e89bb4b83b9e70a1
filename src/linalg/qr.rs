use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::linalg::cached::Cached;
use crate::linalg::solver::{check_cols, check_rows, Solver};
use crate::linalg::LinalgError;
use crate::matrix::Matrix;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// QR decomposition in place using Householder reflections.
///
/// On return, the upper triangle of `a` (excluding the diagonal) holds `R`
/// and the lower trapezoid (including the diagonal) holds the Householder
/// vectors; the diagonal of `R` goes to `rdiag` (length `min(M, N)`).
///
/// Each column norm is accumulated with `hypot` and takes the sign of the
/// pivot, so `v[k] = 1 + |a[k][k]| / |a|` never cancels. A zero column skips
/// its reflector and leaves `rdiag[k] == 0`.
///
/// Returns the number of reflectors applied.
pub fn qr_in_place<T: FloatScalar>(a: &mut impl MatrixMut<T>, rdiag: &mut [T]) -> usize {
    let m = a.nrows();
    let n = a.ncols();
    let p = m.min(n);
    assert_eq!(rdiag.len(), p, "rdiag length must equal min(M, N)");

    let mut reflections = 0;
    for k in 0..p {
        let mut nrm = a
            .col_as_slice(k, k)
            .iter()
            .fold(T::zero(), |acc, &x| acc.hypot(x));

        if nrm != T::zero() {
            if *a.get(k, k) < T::zero() {
                nrm = -nrm;
            }
            for x in a.col_as_mut_slice(k, k) {
                *x = *x / nrm;
            }
            let vk = *a.get(k, k) + T::one();
            *a.get_mut(k, k) = vk;

            for j in (k + 1)..n {
                let (x, v) = a.col_pair_mut(j, k, k);
                reflect(v, x);
            }
            reflections += 1;
        }
        rdiag[k] = -nrm;
    }
    reflections
}

/// Apply `H = I − v·vᵗ / v[0]` to `x`.
///
/// Uses `s = −⟨v, x⟩ / v[0]`, which equals `−2⟨v, x⟩ / |v|²` for the
/// vectors built by [`qr_in_place`].
#[inline]
pub(crate) fn reflect<T: FloatScalar>(v: &[T], x: &mut [T]) {
    let dot = v.iter().zip(x.iter()).fold(T::zero(), |acc, (&a, &b)| acc + a * b);
    let s = -dot / v[0];
    for (xi, &vi) in x.iter_mut().zip(v) {
        *xi = *xi + s * vi;
    }
}

/// Configuration for [`QrDecomposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    /// Materialize the reduced `Q` (m×min(m,n)) and `R` (min(m,n)×n)
    /// instead of the full m×m and m×n.
    pub economy: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self { economy: true }
    }
}

/// QR decomposition of an M×N matrix: `A = Q·R`.
///
/// `Q` is orthogonal and `R` upper triangular. For M > N, solving gives the
/// least-squares solution. `Q`, `Qᵗ`, `R` and `H` are computed on first
/// access and cached.
///
/// # Example
///
/// ```
/// use linfact::{Matrix, QrDecomposition, Solver};
///
/// // Fit y = c0 + c1·x through (0, 1), (1, 3), (2, 5).
/// let x = Matrix::from_rows(3, 2, &[1.0_f64, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let y = Matrix::from_rows(3, 1, &[1.0, 3.0, 5.0]);
/// let qr = QrDecomposition::new(&x);
/// let c = qr.solve(&y).unwrap();
/// assert!((c[(0, 0)] - 1.0).abs() < 1e-12);
/// assert!((c[(1, 0)] - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct QrDecomposition<T> {
    qr: Matrix<T>,
    rdiag: Vec<T>,
    reflections: usize,
    full_rank: bool,
    economy: bool,
    q: Cached<Matrix<T>>,
    qt: Cached<Matrix<T>>,
    r: Cached<Matrix<T>>,
    h: Cached<Matrix<T>>,
}

impl<T: FloatScalar> QrDecomposition<T> {
    /// Decompose `a`, producing the economy-size factors.
    pub fn new(a: &Matrix<T>) -> Self {
        Self::from_owned(a.clone(), &QrOptions::default())
    }

    pub fn with_options(a: &Matrix<T>, options: &QrOptions) -> Self {
        Self::from_owned(a.clone(), options)
    }

    /// Decompose `a`, reusing its storage for the packed factors.
    pub fn from_owned(mut a: Matrix<T>, options: &QrOptions) -> Self {
        let (m, n) = a.shape();
        let mut rdiag = vec![T::zero(); m.min(n)];
        let reflections = qr_in_place(&mut a, &mut rdiag);
        let full_rank = m >= n && rdiag.iter().all(|&d| d != T::zero());
        if !full_rank {
            debug!(target: "linfact", "qr: {}x{} matrix is rank deficient", m, n);
        }
        Self {
            qr: a,
            rdiag,
            reflections,
            full_rank,
            economy: options.economy,
            q: Cached::new(),
            qt: Cached::new(),
            r: Cached::new(),
            h: Cached::new(),
        }
    }

    #[inline]
    fn minor(&self) -> usize {
        self.rdiag.len()
    }

    /// Apply the reflectors to every column of `x` (M rows): `H_0` first
    /// when `ascending` (forms `Qᵗ·x`), `H_{p−1}` first otherwise (`Q·x`).
    fn apply_reflectors(&self, x: &mut Matrix<T>, ascending: bool) {
        let p = self.minor();
        for c in 0..x.ncols() {
            let col = x.col_as_mut_slice(c, 0);
            let mut step = |k: usize| {
                let v = self.qr.col_as_slice(k, k);
                if v[0] != T::zero() {
                    reflect(v, &mut col[k..]);
                }
            };
            if ascending {
                (0..p).for_each(&mut step);
            } else {
                (0..p).rev().for_each(&mut step);
            }
        }
    }

    /// Orthogonal factor: M×min(M,N) in economy mode, M×M otherwise.
    pub fn q(&self) -> &Matrix<T> {
        self.q.get_or_init(|| {
            let m = self.qr.nrows();
            let cols = if self.economy { self.minor() } else { m };
            let mut q = Matrix::identity(m, cols);
            self.apply_reflectors(&mut q, false);
            q
        })
    }

    /// `Qᵗ`, computed on first access.
    pub fn qt(&self) -> &Matrix<T> {
        self.qt.get_or_init(|| self.q().transpose())
    }

    /// Upper-triangular factor: min(M,N)×N in economy mode, M×N otherwise.
    pub fn r(&self) -> &Matrix<T> {
        self.r.get_or_init(|| {
            let (m, n) = self.qr.shape();
            let rows = if self.economy { self.minor() } else { m };
            Matrix::from_fn(rows, n, |i, j| {
                if i < j {
                    self.qr[(i, j)]
                } else if i == j {
                    self.rdiag[i]
                } else {
                    T::zero()
                }
            })
        })
    }

    /// Householder vectors, one per column of the lower trapezoid.
    pub fn h(&self) -> &Matrix<T> {
        self.h.get_or_init(|| {
            let m = self.qr.nrows();
            Matrix::from_fn(m, self.minor(), |i, j| {
                if i >= j {
                    self.qr[(i, j)]
                } else {
                    T::zero()
                }
            })
        })
    }

    /// Diagonal of `R`.
    pub fn diagonal(&self) -> &[T] {
        &self.rdiag
    }

    /// Determinant of a square input.
    pub fn det(&self) -> Result<T, LinalgError> {
        let (m, n) = self.qr.shape();
        if m != n {
            return Err(LinalgError::NotSquare { rows: m, cols: n });
        }
        let prod = self.rdiag.iter().fold(T::one(), |acc, &d| acc * d);
        Ok(if self.reflections % 2 == 1 { -prod } else { prod })
    }

    /// Whether `Q` and `R` are the reduced factors.
    pub fn is_economy(&self) -> bool {
        self.economy
    }

    #[inline]
    fn ensure_full_rank(&self) -> Result<(), LinalgError> {
        if self.full_rank {
            Ok(())
        } else {
            Err(LinalgError::RankDeficient)
        }
    }

    /// `R⁻¹` (N×N) by back substitution.
    fn r_inverse(&self) -> Matrix<T> {
        let n = self.qr.ncols();
        let mut inv = Matrix::eye(n);
        for c in 0..n {
            let col = inv.col_as_mut_slice(c, 0);
            for k in (0..=c).rev() {
                col[k] = col[k] / self.rdiag[k];
                let xk = col[k];
                for (y, &r) in col[..k].iter_mut().zip(self.qr.col_as_slice(k, 0)) {
                    *y = *y - xk * r;
                }
            }
        }
        inv
    }
}

impl<T: FloatScalar> Solver<T> for QrDecomposition<T> {
    fn nrows(&self) -> usize {
        self.qr.nrows()
    }

    fn ncols(&self) -> usize {
        self.qr.ncols()
    }

    /// Least-squares solution of `A·X = B`.
    fn solve(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        let (m, n) = self.qr.shape();
        check_rows(b, m)?;
        self.ensure_full_rank()?;

        let mut x = b.clone();
        self.apply_reflectors(&mut x, true);
        for c in 0..x.ncols() {
            let col = x.col_as_mut_slice(c, 0);
            for k in (0..n).rev() {
                col[k] = col[k] / self.rdiag[k];
                let xk = col[k];
                for (y, &r) in col[..k].iter_mut().zip(self.qr.col_as_slice(k, 0)) {
                    *y = *y - xk * r;
                }
            }
        }
        Ok(if m == n { x } else { x.block(0, 0, n, b.ncols()) })
    }

    /// Solve `X·A = B` as `X = B·R⁻¹·Qᵗ`; minimum-norm for M > N.
    fn solve_transpose(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        let (m, n) = self.qr.shape();
        check_cols(b, n)?;
        self.ensure_full_rank()?;

        // Y·R = B, one column of Y at a time.
        let rows = b.nrows();
        let mut y = b.clone();
        for j in 0..n {
            for k in 0..j {
                let rkj = self.qr[(k, j)];
                let (yj, yk) = y.col_pair_mut(j, k, 0);
                for (t, &s) in yj.iter_mut().zip(yk) {
                    *t = *t - rkj * s;
                }
            }
            let inv = T::one() / self.rdiag[j];
            for t in y.col_as_mut_slice(j, 0) {
                *t = *t * inv;
            }
        }

        // Xᵗ = Q·Yᵗ with Yᵗ padded to M rows.
        let mut z = Matrix::from_fn(m, rows, |i, c| if i < n { y[(c, i)] } else { T::zero() });
        self.apply_reflectors(&mut z, false);
        Ok(z.transpose())
    }

    fn reverse(&self) -> Result<Matrix<T>, LinalgError> {
        Ok(self.q() * self.r())
    }

    /// `(AᵗA)⁻¹ = R⁻¹·R⁻ᵗ`.
    fn information_matrix(&self) -> Result<Matrix<T>, LinalgError> {
        self.ensure_full_rank()?;
        let rinv = self.r_inverse();
        Ok(&rinv * &rinv.transpose())
    }

    fn is_non_singular(&self) -> bool {
        self.full_rank && self.qr.is_square()
    }

    fn is_full_rank(&self) -> bool {
        self.full_rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!(
            (a - b).abs() < tol,
            "{}: {} vs {} (diff {})",
            msg,
            a,
            b,
            (a - b).abs()
        );
    }

    fn assert_orthonormal_columns(q: &Matrix<f64>, tol: f64) {
        let qtq = q.transpose_mul(q);
        let id = Matrix::eye(q.ncols());
        assert!(qtq.max_abs_diff(&id) < tol, "QᵗQ != I: {:?}", qtq);
    }

    fn a3() -> Matrix<f64> {
        Matrix::from_rows(3, 3, &[12.0, -51.0, 4.0, 6.0, 167.0, -68.0, -4.0, 24.0, -41.0])
    }

    #[test]
    fn square_3x3() {
        let a = a3();
        let qr = QrDecomposition::new(&a);
        assert!(qr.is_full_rank());
        assert!(qr.is_non_singular());
        assert_orthonormal_columns(qr.q(), 1e-12);
        let r = qr.r();
        for i in 0..3 {
            for j in 0..i {
                assert_eq!(r[(i, j)], 0.0);
            }
        }
        // |R| diagonal matches the textbook factorization.
        assert_near(r[(0, 0)].abs(), 14.0, 1e-10, "R[0,0]");
        assert_near(r[(1, 1)].abs(), 175.0, 1e-10, "R[1,1]");
        assert_near(r[(2, 2)].abs(), 35.0, 1e-10, "R[2,2]");
        assert!(qr.reverse().unwrap().max_abs_diff(&a) < 1e-10);
    }

    #[test]
    fn det_with_sign() {
        let a = a3();
        let qr = QrDecomposition::new(&a);
        // det = 12(167·-41 + 68·24) + 51(6·-41 - 68·4) + 4(6·24 + 167·4)
        assert_near(qr.det().unwrap(), -85750.0, 1e-8, "det");

        let swap = Matrix::from_rows(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert_near(QrDecomposition::new(&swap).det().unwrap(), -1.0, 1e-14, "det swap");

        let tall: Matrix<f64> = Matrix::zeros(3, 2);
        assert!(QrDecomposition::new(&tall).det().is_err());
    }

    #[test]
    fn tall_economy_and_full() {
        let a = Matrix::from_rows(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);

        let eco = QrDecomposition::new(&a);
        assert!(eco.is_economy());
        assert_eq!(eco.q().shape(), (4, 2));
        assert_eq!(eco.r().shape(), (2, 2));
        assert_orthonormal_columns(eco.q(), 1e-12);
        assert!(eco.reverse().unwrap().max_abs_diff(&a) < 1e-12);

        let full = QrDecomposition::with_options(&a, &QrOptions { economy: false });
        assert_eq!(full.q().shape(), (4, 4));
        assert_eq!(full.r().shape(), (4, 2));
        assert_orthonormal_columns(full.q(), 1e-12);
        assert_eq!(full.r()[(3, 1)], 0.0);
        assert!(full.reverse().unwrap().max_abs_diff(&a) < 1e-12);
        assert!(full.is_full_rank());
        assert!(!full.is_non_singular());
    }

    #[test]
    fn wide_is_not_full_rank() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let qr = QrDecomposition::new(&a);
        assert!(!qr.is_full_rank());
        assert_eq!(qr.q().shape(), (2, 2));
        assert_eq!(qr.r().shape(), (2, 3));
        assert!(qr.reverse().unwrap().max_abs_diff(&a) < 1e-12);
        assert_eq!(
            qr.solve(&Matrix::zeros(2, 1)).unwrap_err(),
            LinalgError::RankDeficient
        );
    }

    #[test]
    fn solve_square() {
        let a = a3();
        let qr = QrDecomposition::new(&a);
        let b = Matrix::from_rows(3, 2, &[1.0, 0.0, 0.0, 1.0, 2.0, -1.0]);
        let x = qr.solve(&b).unwrap();
        assert!((&a * &x).max_abs_diff(&b) < 1e-10);
        let inv = qr.inverse().unwrap();
        assert!((&a * &inv).max_abs_diff(&Matrix::eye(3)) < 1e-12);
    }

    #[test]
    fn least_squares_line_fit() {
        // y = 1 + 2x at x = 0..4, exactly representable
        let x = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = Matrix::from_rows(4, 1, &[1.0, 3.0, 5.0, 7.0]);
        let c = QrDecomposition::new(&x).solve(&y).unwrap();
        assert_eq!(c.shape(), (2, 1));
        assert_near(c[(0, 0)], 1.0, 1e-12, "intercept");
        assert_near(c[(1, 0)], 2.0, 1e-12, "slope");
    }

    #[test]
    fn least_squares_normal_equations() {
        // Noisy fit: residual must be orthogonal to the columns of A.
        let a = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = Matrix::from_rows(4, 1, &[1.0, 2.0, 2.0, 4.0]);
        let x = QrDecomposition::new(&a).solve(&b).unwrap();
        let resid = &(&a * &x) - &b;
        let g = a.transpose_mul(&resid);
        assert_near(g[(0, 0)], 0.0, 1e-12, "Aᵗr[0]");
        assert_near(g[(1, 0)], 0.0, 1e-12, "Aᵗr[1]");
    }

    #[test]
    fn solve_transpose_square_and_tall() {
        let a = a3();
        let qr = QrDecomposition::new(&a);
        let b = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, -1.0, 0.0, 1.0]);
        let x = qr.solve_transpose(&b).unwrap();
        assert!((&x * &a).max_abs_diff(&b) < 1e-10);

        let tall = Matrix::from_rows(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
        let qr = QrDecomposition::new(&tall);
        let b = Matrix::from_rows(1, 2, &[1.0, 1.0]);
        let x = qr.solve_transpose(&b).unwrap();
        assert_eq!(x.shape(), (1, 4));
        assert!((&x * &tall).max_abs_diff(&b) < 1e-12);
    }

    #[test]
    fn zero_row_is_rank_deficient() {
        let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0, 0.0, 0.0]);
        let qr = QrDecomposition::new(&a);
        assert!(!qr.is_full_rank());
        assert!(!qr.is_non_singular());
        assert_eq!(qr.diagonal()[2], 0.0);
        assert_eq!(qr.solve(&Matrix::eye(3)).unwrap_err(), LinalgError::RankDeficient);
        assert_eq!(qr.inverse().unwrap_err(), LinalgError::RankDeficient);
        assert_eq!(qr.information_matrix().unwrap_err(), LinalgError::RankDeficient);
        assert_eq!(qr.det().unwrap(), 0.0);
        // Factors are still available.
        assert!(qr.reverse().unwrap().max_abs_diff(&a) < 1e-12);
    }

    #[test]
    fn information_matrix_tall() {
        let a = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let info = QrDecomposition::new(&a).information_matrix().unwrap();
        let ata = a.transpose_mul(&a);
        assert!((&info * &ata).max_abs_diff(&Matrix::eye(2)) < 1e-12);
    }

    #[test]
    fn householder_vectors() {
        let qr = QrDecomposition::new(&a3());
        let h = qr.h();
        assert_eq!(h.shape(), (3, 3));
        assert_eq!(h[(0, 1)], 0.0);
        // v[k] = 1 + |a| / nrm lies in [1, 2]
        for k in 0..3 {
            assert!(h[(k, k)] >= 1.0 && h[(k, k)] <= 2.0);
        }
    }

    #[test]
    fn cached_views_are_stable() {
        let qr = QrDecomposition::new(&a3());
        assert!(core::ptr::eq(qr.q(), qr.q()));
        assert!(core::ptr::eq(qr.r(), qr.r()));
        assert_eq!(qr.qt(), &qr.q().transpose());
    }

    #[test]
    fn dimension_mismatch() {
        let qr = QrDecomposition::new(&a3());
        assert_eq!(
            qr.solve(&Matrix::zeros(2, 1)).unwrap_err(),
            LinalgError::DimensionMismatch {
                expected: (3, 1),
                got: (2, 1)
            }
        );
        assert!(qr.solve_transpose(&Matrix::zeros(1, 2)).is_err());
    }

    #[test]
    fn in_place_on_matrix_mut() {
        let mut a = a3();
        let mut rdiag = [0.0; 3];
        let reflections = qr_in_place(&mut a, &mut rdiag[..]);
        assert_eq!(reflections, 3);
        assert_near(rdiag[0].abs(), 14.0, 1e-10, "rdiag[0]");
    }

    #[test]
    fn f32_support() {
        let a = Matrix::from_rows(2, 2, &[4.0_f32, 3.0, 6.0, 3.0]);
        let qr = QrDecomposition::new(&a);
        assert!((qr.det().unwrap() - (-6.0)).abs() < 1e-4);
    }
}
