use alloc::vec;
use alloc::vec::Vec;

use log::{trace, warn};

use crate::linalg::cached::Cached;
use crate::linalg::qr::reflect;
use crate::linalg::solver::{check_cols, check_rows, Solver};
use crate::linalg::LinalgError;
use crate::matrix::Matrix;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

// ── Householder bidiagonalization ───────────────────────────────────

/// Reduce an M×N matrix (M ≥ N ≥ 1) to upper bidiagonal form.
///
/// Column and row reflectors alternate. On return `s[0..n]` holds the
/// diagonal and `e[0..n-1]` the superdiagonal (`e[n-1] == 0`). When given,
/// `u` (M×N) and `v` (N×N) receive the accumulated orthogonal factors so that
/// `A = U · B · Vᵗ`. `a` is overwritten.
pub(crate) fn bidiagonalize<T: FloatScalar>(
    a: &mut Matrix<T>,
    s: &mut [T],
    e: &mut [T],
    mut u: Option<&mut Matrix<T>>,
    mut v: Option<&mut Matrix<T>>,
) {
    let (m, n) = a.shape();
    debug_assert!(m >= n && n >= 1);
    let nct = (m - 1).min(n);
    let nrt = n.saturating_sub(2).min(m);
    let mut work = vec![T::zero(); m];

    for k in 0..nct.max(nrt) {
        if k < nct {
            let mut nrm = a
                .col_as_slice(k, k)
                .iter()
                .fold(T::zero(), |acc, &x| acc.hypot(x));
            if nrm != T::zero() {
                if a[(k, k)] < T::zero() {
                    nrm = -nrm;
                }
                for x in a.col_as_mut_slice(k, k) {
                    *x = *x / nrm;
                }
                a[(k, k)] = a[(k, k)] + T::one();
            }
            s[k] = -nrm;
        }
        for j in (k + 1)..n {
            if k < nct && s[k] != T::zero() {
                let (x, vk) = a.col_pair_mut(j, k, k);
                reflect(vk, x);
            }
            // Row k, to be reduced by the right reflector.
            e[j] = a[(k, j)];
        }
        if k < nct {
            if let Some(u) = u.as_deref_mut() {
                u.col_as_mut_slice(k, k).copy_from_slice(a.col_as_slice(k, k));
            }
        }

        if k < nrt {
            let mut nrm = e[k + 1..n].iter().fold(T::zero(), |acc, &x| acc.hypot(x));
            if nrm != T::zero() {
                if e[k + 1] < T::zero() {
                    nrm = -nrm;
                }
                for x in &mut e[k + 1..n] {
                    *x = *x / nrm;
                }
                e[k + 1] = e[k + 1] + T::one();
            }
            e[k] = -nrm;
            if k + 1 < m && e[k] != T::zero() {
                let w = &mut work[k + 1..m];
                w.fill(T::zero());
                for j in (k + 1)..n {
                    let ej = e[j];
                    for (wi, &x) in w.iter_mut().zip(a.col_as_slice(j, k + 1)) {
                        *wi = *wi + ej * x;
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for (x, &wi) in a.col_as_mut_slice(j, k + 1).iter_mut().zip(w.iter()) {
                        *x = *x + t * wi;
                    }
                }
            }
            if let Some(v) = v.as_deref_mut() {
                v.col_as_mut_slice(k, k + 1).copy_from_slice(&e[k + 1..n]);
            }
        }
    }

    // Last diagonal and superdiagonal entries left untouched by reflectors.
    if nct < n {
        s[nct] = a[(nct, nct)];
    }
    if nrt + 1 < n {
        e[nrt] = a[(nrt, n - 1)];
    }
    e[n - 1] = T::zero();

    if let Some(u) = u {
        for j in nct..n {
            u.col_as_mut_slice(j, 0).fill(T::zero());
            u[(j, j)] = T::one();
        }
        for k in (0..nct).rev() {
            if s[k] != T::zero() {
                for j in (k + 1)..n {
                    let (x, vk) = u.col_pair_mut(j, k, k);
                    reflect(vk, x);
                }
                for x in u.col_as_mut_slice(k, k) {
                    *x = -*x;
                }
                u[(k, k)] = T::one() + u[(k, k)];
                u.col_as_mut_slice(k, 0)[..k].fill(T::zero());
            } else {
                u.col_as_mut_slice(k, 0).fill(T::zero());
                u[(k, k)] = T::one();
            }
        }
    }

    if let Some(v) = v {
        for k in (0..n).rev() {
            if k < nrt && e[k] != T::zero() {
                for j in (k + 1)..n {
                    let (x, vk) = v.col_pair_mut(j, k, k + 1);
                    reflect(vk, x);
                }
            }
            v.col_as_mut_slice(k, 0).fill(T::zero());
            v[(k, k)] = T::one();
        }
    }
}

// ── Golub-Kahan bidiagonal QR ───────────────────────────────────────

/// Plane rotation of columns `a` and `b`:
/// `(x_a, x_b) ← (cs·x_a + sn·x_b, −sn·x_a + cs·x_b)`.
#[inline]
fn rotate<T: FloatScalar>(m: &mut Matrix<T>, a: usize, b: usize, cs: T, sn: T) {
    let (xa, xb) = m.cols_mut(a, b);
    for (x, y) in xa.iter_mut().zip(xb.iter_mut()) {
        let t = cs * *x + sn * *y;
        *y = cs * *y - sn * *x;
        *x = t;
    }
}

/// Diagonalize the bidiagonal `(s, e)` with implicit-shift QR sweeps.
///
/// Each pass classifies the active block `0..p`:
///
/// 1. `s[p-1]` negligible: chase `e[p-2]` out with rotations on `V`.
/// 2. some interior `s[k-1]` negligible: split there, rotating `U`.
/// 3. otherwise: one shifted QR step with the shift taken from the trailing
///    2×2 of `BᵗB`, chasing the bulge down the band.
/// 4. `e[p-2]` negligible: `s[p-1]` has converged; make it non-negative,
///    insert it into descending order and shrink `p`.
///
/// An entry `x` counts as negligible when `|x| <= TINY + ε·(neighbours)` or
/// when it is NaN, so a poisoned input still terminates. More than
/// `max_sweeps` QR steps on one singular value fail with
/// [`LinalgError::ConvergenceFailure`].
pub(crate) fn bidiagonal_qr<T: FloatScalar>(
    s: &mut [T],
    e: &mut [T],
    mut u: Option<&mut Matrix<T>>,
    mut v: Option<&mut Matrix<T>>,
    max_sweeps: usize,
) -> Result<(), LinalgError> {
    let n = s.len();
    if n == 0 {
        return Ok(());
    }
    let eps = T::epsilon();
    let negligible = |x: T, scale: T| x.abs() <= T::TINY + eps * scale || x.is_nan();
    let two = T::one() + T::one();
    let last = n - 1;
    let mut p = n;
    let mut iter = 0usize;

    while p > 0 {
        // First row of the trailing unreduced block.
        let start = (0..p - 1)
            .rev()
            .find(|&k| negligible(e[k], s[k].abs() + s[k + 1].abs()))
            .map_or(0, |k| k + 1);
        if start > 0 {
            e[start - 1] = T::zero();
        }

        if start == p - 1 {
            // Case 4: converged.
            let mut k = start;
            if s[k] <= T::zero() {
                s[k] = if s[k] < T::zero() { -s[k] } else { T::zero() };
                if let Some(v) = v.as_deref_mut() {
                    for x in v.col_as_mut_slice(k, 0) {
                        *x = -*x;
                    }
                }
            }
            trace!(
                target: "linfact",
                "svd: singular value {} = {:e} after {} sweeps",
                k,
                s[k].to_report(),
                iter
            );
            while k < last && s[k] < s[k + 1] {
                s.swap(k, k + 1);
                if let Some(v) = v.as_deref_mut() {
                    v.swap_cols(k, k + 1);
                }
                if let Some(u) = u.as_deref_mut() {
                    u.swap_cols(k, k + 1);
                }
                k += 1;
            }
            iter = 0;
            p -= 1;
            continue;
        }

        let split = (start..p).rev().find(|&ks| {
            let mut t = e[ks].abs();
            if ks != start {
                t = t + e[ks - 1].abs();
            }
            negligible(s[ks], t)
        });

        match split {
            Some(ks) if ks == p - 1 => {
                // Case 1: deflate the negligible trailing s.
                s[ks] = T::zero();
                let k = start;
                let mut f = e[p - 2];
                e[p - 2] = T::zero();
                for j in (k..=p - 2).rev() {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] = cs * e[j - 1];
                    }
                    if let Some(v) = v.as_deref_mut() {
                        rotate(v, j, p - 1, cs, sn);
                    }
                }
            }
            Some(ks) => {
                // Case 2: split at the negligible s[ks].
                s[ks] = T::zero();
                let k = ks + 1;
                let mut f = e[k - 1];
                e[k - 1] = T::zero();
                for j in k..p {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] = cs * e[j];
                    if let Some(u) = u.as_deref_mut() {
                        rotate(u, j, k - 1, cs, sn);
                    }
                }
            }
            None => {
                // Case 3: one shifted QR step on s[start..p].
                if iter >= max_sweeps {
                    warn!(
                        target: "linfact",
                        "svd: no convergence for singular value {} after {} sweeps",
                        p - 1,
                        iter
                    );
                    return Err(LinalgError::ConvergenceFailure { iterations: iter });
                }
                let k = start;
                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / two;
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = T::zero();
                if b != T::zero() || c != T::zero() {
                    shift = (b * b + c).sqrt();
                    if b < T::zero() {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                for j in k..p - 1 {
                    let t = f.hypot(g);
                    let cs = f / t;
                    let sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] = cs * s[j + 1];
                    if let Some(v) = v.as_deref_mut() {
                        rotate(v, j, j + 1, cs, sn);
                    }

                    let t = f.hypot(g);
                    let cs = f / t;
                    let sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = cs * s[j + 1] - sn * e[j];
                    g = sn * e[j + 1];
                    e[j + 1] = cs * e[j + 1];
                    if let Some(u) = u.as_deref_mut() {
                        rotate(u, j, j + 1, cs, sn);
                    }
                }
                e[p - 2] = f;
                iter += 1;
            }
        }
    }
    Ok(())
}

/// `max(M, N) · ulp(σ_max)` for singular values sorted largest first.
fn rank_threshold<T: FloatScalar>(s: &[T], nrows: usize, ncols: usize) -> T {
    let smax = s.first().copied().unwrap_or_else(T::zero);
    T::cast_f64(nrows.max(ncols) as f64) * smax.ulp()
}

// ── SvdDecomposition ────────────────────────────────────────────────

/// Configuration for [`SvdDecomposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdOptions {
    /// Accumulate the left singular vectors `U`.
    pub compute_left: bool,
    /// Accumulate the right singular vectors `V`.
    pub compute_right: bool,
    /// QR sweeps allowed on a single singular value before giving up.
    pub max_sweeps: usize,
}

impl Default for SvdOptions {
    fn default() -> Self {
        Self {
            compute_left: true,
            compute_right: true,
            max_sweeps: 75,
        }
    }
}

/// Thin singular value decomposition `A = U · diag(σ) · Vᵗ` of any M×N
/// matrix.
///
/// With `p = min(M, N)`, `U` is M×p, `V` is N×p and `σ` (length p) is sorted
/// in non-increasing order. Wide input is decomposed through its transpose;
/// the factors are swapped back so callers never see the difference beyond
/// [`is_transposed`](Self::is_transposed).
///
/// Solving goes through the pseudo-inverse `V·Σ⁺·Uᵗ` and never fails on
/// singular or rank-deficient input.
///
/// # Example
///
/// ```
/// use linfact::{Matrix, Solver, SvdDecomposition};
///
/// let a = Matrix::from_rows(2, 3, &[3.0_f64, 2.0, 2.0, 2.0, 3.0, -2.0]);
/// let svd = SvdDecomposition::new(&a).unwrap();
/// let sigma = svd.singular_values();
/// assert!((sigma[0] - 5.0).abs() < 1e-12);
/// assert!((sigma[1] - 3.0).abs() < 1e-12);
/// assert_eq!(svd.rank(), 2);
///
/// let back = svd.reverse().unwrap();
/// assert!(back.max_abs_diff(&a) < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SvdDecomposition<T> {
    u: Option<Matrix<T>>,
    v: Option<Matrix<T>>,
    s: Vec<T>,
    nrows: usize,
    ncols: usize,
    rank: usize,
    transposed: bool,
    diagonal_matrix: Cached<Matrix<T>>,
    covariance: Cached<Matrix<T>>,
}

impl<T: FloatScalar> SvdDecomposition<T> {
    /// Decompose `a`, computing both `U` and `V`.
    pub fn new(a: &Matrix<T>) -> Result<Self, LinalgError> {
        Self::from_owned(a.clone(), &SvdOptions::default())
    }

    pub fn with_options(a: &Matrix<T>, options: &SvdOptions) -> Result<Self, LinalgError> {
        Self::from_owned(a.clone(), options)
    }

    /// Decompose `a`, using its buffer as the work matrix when M ≥ N.
    pub fn from_owned(a: Matrix<T>, options: &SvdOptions) -> Result<Self, LinalgError> {
        let (nrows, ncols) = a.shape();
        let transposed = nrows < ncols;
        let mut work = if transposed { a.transpose() } else { a };
        let (m, n) = work.shape();
        let (want_u, want_v) = if transposed {
            (options.compute_right, options.compute_left)
        } else {
            (options.compute_left, options.compute_right)
        };

        let mut s = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        let mut u = want_u.then(|| Matrix::zeros(m, n));
        let mut v = want_v.then(|| Matrix::zeros(n, n));
        if n > 0 {
            bidiagonalize(&mut work, &mut s, &mut e, u.as_mut(), v.as_mut());
            bidiagonal_qr(&mut s, &mut e, u.as_mut(), v.as_mut(), options.max_sweeps)?;
        }

        let tol = rank_threshold(&s, nrows, ncols);
        let rank = s.iter().filter(|&&x| x > tol).count();
        let (u, v) = if transposed { (v, u) } else { (u, v) };
        Ok(Self {
            u,
            v,
            s,
            nrows,
            ncols,
            rank,
            transposed,
            diagonal_matrix: Cached::new(),
            covariance: Cached::new(),
        })
    }

    /// Singular values, largest first.
    pub fn singular_values(&self) -> &[T] {
        &self.s
    }

    /// `diag(σ)` (p×p), computed on first access.
    pub fn diagonal_matrix(&self) -> &Matrix<T> {
        self.diagonal_matrix.get_or_init(|| Matrix::from_diagonal(&self.s))
    }

    /// Left singular vectors (M×p).
    pub fn u(&self) -> Result<&Matrix<T>, LinalgError> {
        self.u.as_ref().ok_or(LinalgError::NotComputed { factor: "U" })
    }

    /// Right singular vectors (N×p).
    pub fn v(&self) -> Result<&Matrix<T>, LinalgError> {
        self.v.as_ref().ok_or(LinalgError::NotComputed { factor: "V" })
    }

    /// Whether the transpose of the input was decomposed (M < N).
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Singular values at or below this count as zero:
    /// `max(M, N) · ulp(σ_max)`.
    pub fn threshold(&self) -> T {
        rank_threshold(&self.s, self.nrows, self.ncols)
    }

    /// Number of singular values above [`threshold`](Self::threshold),
    /// fixed at construction.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `σ_max / σ_min`; infinite when `σ_min` is zero.
    pub fn condition_number(&self) -> T {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) if min != T::zero() => max / min,
            _ => T::infinity(),
        }
    }

    /// Largest singular value.
    pub fn two_norm(&self) -> T {
        self.s.first().copied().unwrap_or_else(T::zero)
    }

    /// `|det(A)|` as the product of all singular values.
    pub fn absolute_determinant(&self) -> T {
        self.s.iter().fold(T::one(), |acc, &x| acc * x)
    }

    pub fn ln_absolute_determinant(&self) -> T {
        self.s.iter().fold(T::zero(), |acc, &x| acc + x.ln())
    }

    /// Product of the singular values above the rank threshold.
    pub fn pseudo_determinant(&self) -> T {
        let tol = self.threshold();
        self.s
            .iter()
            .filter(|&&x| x > tol)
            .fold(T::one(), |acc, &x| acc * x)
    }

    pub fn ln_pseudo_determinant(&self) -> T {
        let tol = self.threshold();
        self.s
            .iter()
            .filter(|&&x| x > tol)
            .fold(T::zero(), |acc, &x| acc + x.ln())
    }

    /// `V · Σ⁺² · Vᵗ`, the pseudo-inverse of `AᵗA`. Cached.
    pub fn covariance(&self) -> Result<&Matrix<T>, LinalgError> {
        let v = self.v()?;
        Ok(self.covariance.get_or_init(|| {
            let inv = self.inverse_singular_values();
            let mut w = v.clone();
            for (k, &si) in inv.iter().enumerate() {
                for x in w.col_as_mut_slice(k, 0) {
                    *x = *x * si;
                }
            }
            &w * &w.transpose()
        }))
    }

    /// `Σ⁺`: reciprocals of the singular values above the threshold, zero
    /// for the rest.
    fn inverse_singular_values(&self) -> Vec<T> {
        let tol = self.threshold();
        self.s
            .iter()
            .map(|&x| if x > tol { T::one() / x } else { T::zero() })
            .collect()
    }
}

impl<T: FloatScalar> Solver<T> for SvdDecomposition<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    /// Minimum-norm least-squares solution `V·Σ⁺·Uᵗ·B`.
    fn solve(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        check_rows(b, self.nrows)?;
        let u = self.u()?;
        let v = self.v()?;
        let mut y = u.transpose_mul(b);
        for (k, &si) in self.inverse_singular_values().iter().enumerate() {
            for c in 0..y.ncols() {
                y[(k, c)] = y[(k, c)] * si;
            }
        }
        Ok(v * &y)
    }

    /// `X = B·V·Σ⁺·Uᵗ`.
    fn solve_transpose(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        check_cols(b, self.ncols)?;
        let u = self.u()?;
        let v = self.v()?;
        let mut y = b * v;
        for (k, &si) in self.inverse_singular_values().iter().enumerate() {
            for x in y.col_as_mut_slice(k, 0) {
                *x = *x * si;
            }
        }
        Ok(&y * &u.transpose())
    }

    fn reverse(&self) -> Result<Matrix<T>, LinalgError> {
        let mut us = self.u()?.clone();
        let v = self.v()?;
        for (k, &si) in self.s.iter().enumerate() {
            for x in us.col_as_mut_slice(k, 0) {
                *x = *x * si;
            }
        }
        Ok(&us * &v.transpose())
    }

    fn information_matrix(&self) -> Result<Matrix<T>, LinalgError> {
        self.covariance().cloned()
    }

    fn is_non_singular(&self) -> bool {
        self.nrows == self.ncols && self.rank == self.ncols
    }

    fn is_full_rank(&self) -> bool {
        self.rank == self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

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

    fn assert_orthonormal_columns(q: &Matrix<f64>, tol: f64, name: &str) {
        let qtq = q.transpose_mul(q);
        assert!(
            qtq.max_abs_diff(&Matrix::eye(q.ncols())) < tol,
            "{}ᵗ{} != I: {:?}",
            name,
            name,
            qtq
        );
    }

    fn assert_sorted(s: &[f64]) {
        for w in s.windows(2) {
            assert!(w[0] >= w[1], "not descending: {:?}", s);
        }
    }

    fn check_full(a: &Matrix<f64>, tol: f64) {
        let svd = SvdDecomposition::new(a).unwrap();
        let p = a.nrows().min(a.ncols());
        assert_eq!(svd.singular_values().len(), p);
        assert_sorted(svd.singular_values());
        assert!(svd.singular_values().iter().all(|&x| x >= 0.0));
        assert_eq!(svd.u().unwrap().shape(), (a.nrows(), p));
        assert_eq!(svd.v().unwrap().shape(), (a.ncols(), p));
        assert_orthonormal_columns(svd.u().unwrap(), tol, "U");
        assert_orthonormal_columns(svd.v().unwrap(), tol, "V");
        let back = svd.reverse().unwrap();
        assert!(back.max_abs_diff(a) < tol, "UΣVᵗ != A: {:?}", back);
    }

    #[test]
    fn identity_3x3() {
        let svd = SvdDecomposition::new(&Matrix::<f64>::eye(3)).unwrap();
        for i in 0..3 {
            assert_near(svd.singular_values()[i], 1.0, TOL, &format!("σ[{}]", i));
        }
        assert_eq!(svd.rank(), 3);
        assert!(svd.is_non_singular());
        assert!(svd.is_full_rank());
    }

    #[test]
    fn diagonal_with_negative() {
        let a = Matrix::from_diagonal(&[3.0, -5.0, 1.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert_near(svd.singular_values()[0], 5.0, TOL, "σ[0]");
        assert_near(svd.singular_values()[1], 3.0, TOL, "σ[1]");
        assert_near(svd.singular_values()[2], 1.0, TOL, "σ[2]");
        check_full(&a, 1e-12);
    }

    #[test]
    fn known_2x2() {
        // AᵗA = [[25, 20], [20, 25]] has eigenvalues 45 and 5.
        let a = Matrix::from_rows(2, 2, &[3.0, 0.0, 4.0, 5.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert_near(svd.singular_values()[0], 45.0_f64.sqrt(), TOL, "σ[0]");
        assert_near(svd.singular_values()[1], 5.0_f64.sqrt(), TOL, "σ[1]");
        assert_near(svd.absolute_determinant(), 15.0, 1e-10, "|det|");
        assert_near(svd.ln_absolute_determinant(), 15.0_f64.ln(), 1e-12, "ln|det|");
        check_full(&a, 1e-12);
    }

    #[test]
    fn reconstruction_square_tall_and_wide() {
        let sq = Matrix::from_rows(
            4,
            4,
            &[
                4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.0, 3.0, -2.0, 2.0, 1.0, -2.0, -1.0,
            ],
        );
        check_full(&sq, 1e-12);

        let tall = Matrix::from_rows(
            5,
            3,
            &[
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0, -1.0, 0.5, 2.0, 3.0, -3.0, 1.0,
            ],
        );
        check_full(&tall, 1e-11);

        let wide = tall.transpose();
        let svd = SvdDecomposition::new(&wide).unwrap();
        assert!(svd.is_transposed());
        check_full(&wide, 1e-11);

        let s_tall = SvdDecomposition::new(&tall).unwrap();
        for i in 0..3 {
            assert_near(
                svd.singular_values()[i],
                s_tall.singular_values()[i],
                1e-12,
                &format!("σ[{}]", i),
            );
        }
    }

    #[test]
    fn rank_deficient() {
        let a = Matrix::from_rows(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert_eq!(svd.rank(), 1);
        assert!(!svd.is_full_rank());
        assert!(svd.singular_values()[1] <= svd.threshold());
        assert_near(svd.pseudo_determinant(), svd.singular_values()[0], 1e-12, "pdet");
        assert_near(
            svd.ln_pseudo_determinant(),
            svd.singular_values()[0].ln(),
            1e-12,
            "ln pdet",
        );
        check_full(&a, 1e-12);
    }

    #[test]
    fn rank_flags_follow_stored_rank() {
        let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 5.0, 6.0, 0.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        let expected = svd
            .singular_values()
            .iter()
            .filter(|&&x| x > svd.threshold())
            .count();
        assert_eq!(svd.rank(), expected);
        assert_eq!(svd.rank(), 2);
        assert!(!svd.is_full_rank());
        assert!(!svd.is_non_singular());

        let copy = svd.clone();
        assert_eq!(copy.rank(), 2);
        assert!(!copy.is_full_rank());

        let b = Matrix::from_rows(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let tall = SvdDecomposition::new(&b).unwrap();
        assert_eq!(tall.rank(), 2);
        assert!(tall.is_full_rank());
        assert!(!tall.is_non_singular());
    }

    #[test]
    fn norms_and_condition() {
        let a = Matrix::from_diagonal(&[4.0, 1.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert_near(svd.condition_number(), 4.0, TOL, "cond");
        assert_near(svd.two_norm(), 4.0, TOL, "norm");

        let z: Matrix<f64> = Matrix::zeros(3, 2);
        let svd = SvdDecomposition::new(&z).unwrap();
        assert_eq!(svd.rank(), 0);
        assert!(svd.condition_number().is_infinite());
        let x = svd.solve(&Matrix::fill(3, 1, 1.0)).unwrap();
        assert_eq!(x, Matrix::zeros(2, 1));
    }

    #[test]
    fn solve_square() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = Matrix::from_rows(3, 1, &[8.0, -11.0, -3.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        let x = svd.solve(&b).unwrap();
        assert_near(x[(0, 0)], 2.0, 1e-12, "x0");
        assert_near(x[(1, 0)], 3.0, 1e-12, "x1");
        assert_near(x[(2, 0)], -1.0, 1e-12, "x2");
        let inv = svd.inverse().unwrap();
        assert!((&a * &inv).max_abs_diff(&Matrix::eye(3)) < 1e-12);
    }

    #[test]
    fn pseudo_inverse_on_singular_input() {
        let a = Matrix::from_rows(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert!(!svd.is_non_singular());
        let x = svd.solve(&Matrix::from_rows(2, 1, &[2.0, 2.0])).unwrap();
        assert!(!x.has_non_finite());
        // Least-norm solution of x0 + x1 = 2.
        assert_near(x[(0, 0)], 1.0, 1e-12, "x0");
        assert_near(x[(1, 0)], 1.0, 1e-12, "x1");
    }

    #[test]
    fn least_squares_tall() {
        let a = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = Matrix::from_rows(4, 1, &[1.0, 2.0, 2.0, 4.0]);
        let x = SvdDecomposition::new(&a).unwrap().solve(&b).unwrap();
        let resid = &(&a * &x) - &b;
        let g = a.transpose_mul(&resid);
        assert_near(g[(0, 0)], 0.0, 1e-12, "Aᵗr[0]");
        assert_near(g[(1, 0)], 0.0, 1e-12, "Aᵗr[1]");
    }

    #[test]
    fn wide_right_inverse() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 0.0, 1.0, 4.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        let pinv = svd.inverse().unwrap();
        assert_eq!(pinv.shape(), (3, 2));
        assert!((&a * &pinv).max_abs_diff(&Matrix::eye(2)) < 1e-12);
    }

    #[test]
    fn solve_transpose() {
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = Matrix::from_rows(2, 3, &[1.0, 0.0, 2.0, -1.0, 1.0, 1.0]);
        let x = SvdDecomposition::new(&a).unwrap().solve_transpose(&b).unwrap();
        assert!((&x * &a).max_abs_diff(&b) < 1e-12);
    }

    #[test]
    fn covariance_is_inverse_gram() {
        let a = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        let cov = svd.covariance().unwrap();
        assert!((cov * &a.transpose_mul(&a)).max_abs_diff(&Matrix::eye(2)) < 1e-12);
        assert_eq!(&svd.information_matrix().unwrap(), cov);
    }

    #[test]
    fn factors_not_requested() {
        let a = Matrix::from_rows(2, 2, &[3.0, 0.0, 4.0, 5.0]);
        let opts = SvdOptions {
            compute_left: false,
            ..SvdOptions::default()
        };
        let svd = SvdDecomposition::with_options(&a, &opts).unwrap();
        assert_eq!(svd.u().unwrap_err(), LinalgError::NotComputed { factor: "U" });
        assert!(svd.v().is_ok());
        assert_near(svd.singular_values()[0], 45.0_f64.sqrt(), TOL, "σ[0]");
        assert_eq!(
            svd.solve(&Matrix::eye(2)).unwrap_err(),
            LinalgError::NotComputed { factor: "U" }
        );

        // Wide input swaps which factor the work matrix accumulates.
        let wide = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 0.0, 1.0, 4.0]);
        let svd = SvdDecomposition::with_options(&wide, &opts).unwrap();
        assert!(svd.u().is_err());
        assert_eq!(svd.v().unwrap().shape(), (3, 2));
    }

    #[test]
    fn sweep_ceiling() {
        let a = Matrix::from_rows(2, 2, &[3.0, 0.0, 4.0, 5.0]);
        let opts = SvdOptions {
            max_sweeps: 0,
            ..SvdOptions::default()
        };
        assert_eq!(
            SvdDecomposition::with_options(&a, &opts).unwrap_err(),
            LinalgError::ConvergenceFailure { iterations: 0 }
        );
    }

    #[test]
    fn nan_input_terminates() {
        let a = Matrix::from_rows(2, 2, &[f64::NAN, 1.0, 1.0, 1.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert!(svd.singular_values().iter().any(|x| x.is_nan()));
    }

    #[test]
    fn size_1x1() {
        let a = Matrix::from_rows(1, 1, &[-7.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert_near(svd.singular_values()[0], 7.0, TOL, "σ[0]");
        assert_eq!(svd.reverse().unwrap(), a);
    }

    #[test]
    fn cached_views_are_stable() {
        let svd = SvdDecomposition::new(&Matrix::from_diagonal(&[2.0, 1.0])).unwrap();
        assert!(core::ptr::eq(svd.diagonal_matrix(), svd.diagonal_matrix()));
        assert!(core::ptr::eq(svd.u().unwrap(), svd.u().unwrap()));
        assert!(core::ptr::eq(svd.covariance().unwrap(), svd.covariance().unwrap()));
        assert_eq!(svd.diagonal_matrix(), &Matrix::from_diagonal(&[2.0, 1.0]));
    }

    #[test]
    fn in_place_constructor() {
        let a = Matrix::from_rows(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let owned = SvdDecomposition::from_owned(a.clone(), &SvdOptions::default()).unwrap();
        let borrowed = SvdDecomposition::new(&a).unwrap();
        assert_eq!(owned.singular_values(), borrowed.singular_values());
    }

    #[test]
    fn f32_support() {
        let a = Matrix::from_rows(2, 2, &[3.0_f32, 0.0, 4.0, 5.0]);
        let svd = SvdDecomposition::new(&a).unwrap();
        assert!((svd.singular_values()[0] - 45.0_f32.sqrt()).abs() < 1e-5);
        assert_eq!(svd.rank(), 2);
    }
}
