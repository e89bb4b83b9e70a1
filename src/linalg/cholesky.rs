use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::linalg::cached::{Cached, FactorState};
use crate::linalg::solver::{check_cols, check_rows, check_square, Solver};
use crate::linalg::LinalgError;
use crate::matrix::Matrix;
use crate::parallel::{for_each_indexed, Parallelism};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Configuration for the strict Cholesky constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CholeskyOptions {
    /// Largest tolerated `|A[i][j] − A[j][i]|` relative to
    /// `max(|A[i][j]|, |A[j][i]|)`.
    pub relative_symmetry_threshold: f64,
    /// Smallest accepted pivot.
    pub absolute_positivity_threshold: f64,
    /// How the trailing rank-1 updates are dispatched.
    pub parallelism: Parallelism,
}

impl Default for CholeskyOptions {
    fn default() -> Self {
        Self {
            relative_symmetry_threshold: 1e-15,
            absolute_positivity_threshold: 1e-10,
            parallelism: Parallelism::None,
        }
    }
}

/// Pivots at or below this fraction of the original diagonal entry clear the
/// soft positive-definite flag of [`CholeskyDecomposition::llt_in_place`].
const SOFT_PIVOT_TOLERANCE: f64 = 1e-14;

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// First pair `i < j` whose asymmetry exceeds `rel · max(|A[i][j]|, |A[j][i]|)`.
fn check_symmetric<T: FloatScalar>(a: &Matrix<T>, rel: T) -> Result<(), LinalgError> {
    let n = a.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let upper = a[(i, j)];
            let lower = a[(j, i)];
            let diff = (upper - lower).abs();
            let allowed = rel * upper.abs().max(lower.abs());
            if !(diff <= allowed) {
                let excess = (diff - allowed).to_report();
                debug!(
                    target: "linfact",
                    "cholesky: asymmetry at ({}, {}) exceeds threshold by {:e}", i, j, excess
                );
                return Err(LinalgError::NotSymmetric {
                    row: i,
                    col: j,
                    excess,
                });
            }
        }
    }
    Ok(())
}

/// Outer-product Cholesky on the lower triangle of `a`.
///
/// Each pivot must reach `threshold` (NaN never does). The trailing update
/// of pivot `k` touches every later column independently, so the columns are
/// handed to [`for_each_indexed`].
fn outer_product_llt<T: FloatScalar>(
    a: &mut Matrix<T>,
    threshold: T,
    parallelism: Parallelism,
) -> Result<(), LinalgError> {
    let n = a.nrows();
    for k in 0..n {
        let d = a[(k, k)];
        if !(d >= threshold) {
            debug!(target: "linfact", "cholesky: pivot {} is {:e}", k, d.to_report());
            return Err(LinalgError::NotPositiveDefinite {
                pivot: k,
                value: d.to_report(),
            });
        }
        let lkk = d.sqrt();
        *a.get_mut(k, k) = lkk;
        let inv = T::one() / lkk;
        for x in a.col_as_mut_slice(k, k + 1) {
            *x = *x * inv;
        }

        let (left, right) = a.split_at_col_mut(k + 1);
        let col_k = &left[k * n..];
        let mut trailing: Vec<&mut [T]> = right.chunks_mut(n).collect();
        for_each_indexed(
            &mut trailing,
            |offset, col| {
                let j = k + 1 + offset;
                let ljk = col_k[j];
                for (x, &l) in col[j..].iter_mut().zip(&col_k[j..]) {
                    *x = *x - ljk * l;
                }
            },
            parallelism,
        );
    }
    Ok(())
}

/// Zero everything above the diagonal.
fn clear_upper<T: FloatScalar>(a: &mut Matrix<T>) {
    let n = a.nrows();
    for j in 1..n {
        for x in &mut a.col_as_mut_slice(j, 0)[..j] {
            *x = T::zero();
        }
    }
}

/// Invert a lower-triangular matrix in place, column by column.
///
/// Column `j` of the inverse only needs entries of `L` from columns `>= j`,
/// which are still untouched when it is computed.
fn invert_lower_in_place<T: FloatScalar>(l: &mut Matrix<T>) {
    let n = l.nrows();
    for j in 0..n {
        let inv_jj = T::one() / l[(j, j)];
        l[(j, j)] = inv_jj;
        for i in (j + 1)..n {
            let mut s = T::zero();
            for k in j..i {
                s = s + l[(i, k)] * l[(k, j)];
            }
            l[(i, j)] = -s / l[(i, i)];
        }
    }
}

/// `diag(A⁻¹)` with `A = L·D·Lᵗ`, consuming `L`.
fn inverse_diagonal_of<T: FloatScalar>(mut l: Matrix<T>, d: &[T]) -> Vec<T> {
    invert_lower_in_place(&mut l);
    let n = l.nrows();
    (0..n)
        .map(|i| {
            l.col_as_slice(i, i)
                .iter()
                .zip(&d[i..])
                .fold(T::zero(), |acc, (&x, &dk)| acc + x * x / dk)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CholeskyDecomposition
// ---------------------------------------------------------------------------

/// Cholesky factorization `A = L·Lᵗ`, or `A = L·D·Lᵗ` with unit `L`.
///
/// [`new`](Self::new) is the strict path: it rejects asymmetric input and
/// any pivot below the positivity threshold. The `*_in_place` constructors
/// reuse the caller's buffer and never reject a square matrix; instead they
/// record a soft positive-definite flag, and a pivot that collapses to
/// exactly zero leaves the factorization undefined.
///
/// # Example
///
/// ```
/// use linfact::{CholeskyDecomposition, Matrix, Solver, Vector};
///
/// let a = Matrix::from_rows(2, 2, &[4.0_f64, 2.0, 2.0, 3.0]);
/// let chol = CholeskyDecomposition::new(&a).unwrap();
///
/// let b = Vector::from_slice(&[8.0, 7.0]);
/// let x = chol.solve_vector(&b).unwrap();
/// assert!((x[0] - 1.25).abs() < 1e-12);
/// assert!((x[1] - 1.5).abs() < 1e-12);
/// assert!((chol.det().unwrap() - 8.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CholeskyDecomposition<T> {
    /// Lower-triangular factor, zeros above the diagonal.
    l: Matrix<T>,
    /// `D` for `L·D·Lᵗ`, all ones for `L·Lᵗ`.
    d: Vec<T>,
    ldlt: bool,
    positive_definite: bool,
    state: FactorState,
    lt: Cached<Matrix<T>>,
    diagonal_matrix: Cached<Matrix<T>>,
}

impl<T: FloatScalar> CholeskyDecomposition<T> {
    /// Decompose a symmetric positive-definite matrix with default
    /// thresholds.
    pub fn new(a: &Matrix<T>) -> Result<Self, LinalgError> {
        Self::with_options(a, &CholeskyOptions::default())
    }

    /// Decompose a symmetric positive-definite matrix.
    ///
    /// Only the upper triangle of `a` feeds the factorization once the
    /// symmetry check has passed.
    pub fn with_options(a: &Matrix<T>, options: &CholeskyOptions) -> Result<Self, LinalgError> {
        let n = check_square(a)?;
        check_symmetric(a, T::cast_f64(options.relative_symmetry_threshold))?;

        let mut l = a.clone();
        for j in 0..n {
            for i in (j + 1)..n {
                l[(i, j)] = l[(j, i)];
            }
        }
        outer_product_llt(
            &mut l,
            T::cast_f64(options.absolute_positivity_threshold),
            options.parallelism,
        )?;
        clear_upper(&mut l);

        Ok(Self::from_parts(l, vec![T::one(); n], false, true, FactorState::Valid))
    }

    /// Left-looking `L·Lᵗ` reusing the storage of `a`.
    ///
    /// Reads the lower triangle. Never fails on a square matrix: asymmetry or
    /// a pivot below `1e-14·|A[j][j]|` only clears
    /// [`is_positive_definite`](Self::is_positive_definite), and a pivot whose
    /// square root is exactly zero stops the sweep and leaves the
    /// factorization undefined.
    pub fn llt_in_place(mut a: Matrix<T>) -> Result<Self, LinalgError> {
        let n = check_square(&a)?;
        let tol = T::cast_f64(SOFT_PIVOT_TOLERANCE);
        let mut positive_definite = true;
        let mut state = FactorState::Valid;

        for j in 0..n {
            let ajj = a[(j, j)];
            for i in (j + 1)..n {
                positive_definite &= a[(i, j)] == a[(j, i)];
            }
            for k in 0..j {
                let ljk = a[(j, k)];
                let (col_j, col_k) = a.col_pair_mut(j, k, j);
                for (x, &l) in col_j.iter_mut().zip(col_k) {
                    *x = *x - ljk * l;
                }
            }

            let d = a[(j, j)];
            positive_definite &= d > tol * ajj.abs();
            let ljj = d.max(T::zero()).sqrt();
            if ljj == T::zero() {
                warn!(target: "linfact", "cholesky: pivot {} collapsed to zero, factorization undefined", j);
                state = FactorState::Undefined;
                break;
            }
            a[(j, j)] = ljj;
            let inv = T::one() / ljj;
            for x in a.col_as_mut_slice(j, j + 1) {
                *x = *x * inv;
            }
        }

        if !positive_definite {
            debug!(target: "linfact", "cholesky: matrix is not positive definite");
        }
        clear_upper(&mut a);
        Ok(Self::from_parts(a, vec![T::one(); n], false, positive_definite, state))
    }

    /// `L·D·Lᵗ` with unit lower `L`, reusing the storage of `a`.
    ///
    /// Reads the lower triangle. Handles symmetric indefinite matrices; an
    /// exactly-zero `D[j]` leaves the factorization undefined. For each
    /// pivot the rows below it are updated through `parallelism` and joined
    /// before the next pivot.
    pub fn ldlt_in_place(mut a: Matrix<T>, parallelism: Parallelism) -> Result<Self, LinalgError> {
        let n = check_square(&a)?;
        let mut d = vec![T::zero(); n];
        let mut ljd = Vec::with_capacity(n);
        let mut positive_definite = true;
        let mut state = FactorState::Valid;

        for j in 0..n {
            for i in (j + 1)..n {
                positive_definite &= a[(i, j)] == a[(j, i)];
            }

            ljd.clear();
            let mut dj = a[(j, j)];
            for k in 0..j {
                let v = a[(j, k)] * d[k];
                dj = dj - a[(j, k)] * v;
                ljd.push(v);
            }
            if dj == T::zero() {
                warn!(target: "linfact", "ldlt: pivot {} is exactly zero, factorization undefined", j);
                state = FactorState::Undefined;
                break;
            }
            positive_definite &= dj > T::zero();
            d[j] = dj;
            a[(j, j)] = T::one();

            let (left, right) = a.split_at_col_mut(j);
            let ljd = &ljd;
            for_each_indexed(
                &mut right[j + 1..n],
                |offset, x| {
                    let i = j + 1 + offset;
                    let s = ljd
                        .iter()
                        .enumerate()
                        .fold(T::zero(), |acc, (k, &v)| acc + left[k * n + i] * v);
                    *x = (*x - s) / dj;
                },
                parallelism,
            );
        }

        if !positive_definite {
            debug!(target: "linfact", "ldlt: matrix is not positive definite");
        }
        clear_upper(&mut a);
        Ok(Self::from_parts(a, d, true, positive_definite, state))
    }

    fn from_parts(l: Matrix<T>, d: Vec<T>, ldlt: bool, positive_definite: bool, state: FactorState) -> Self {
        Self {
            l,
            d,
            ldlt,
            positive_definite,
            state,
            lt: Cached::new(),
            diagonal_matrix: Cached::new(),
        }
    }

    #[inline]
    fn ensure_defined(&self) -> Result<(), LinalgError> {
        match self.state {
            FactorState::Valid => Ok(()),
            FactorState::Undefined => Err(LinalgError::Undefined),
        }
    }

    /// Lower-triangular factor `L` (unit diagonal for `L·D·Lᵗ`).
    pub fn l(&self) -> Result<&Matrix<T>, LinalgError> {
        self.ensure_defined()?;
        Ok(&self.l)
    }

    /// `Lᵗ`, computed on first access.
    pub fn lt(&self) -> Result<&Matrix<T>, LinalgError> {
        self.ensure_defined()?;
        Ok(self.lt.get_or_init(|| self.l.transpose()))
    }

    /// `D` of `L·D·Lᵗ`; all ones for `L·Lᵗ`.
    pub fn diagonal(&self) -> Result<&[T], LinalgError> {
        self.ensure_defined()?;
        Ok(&self.d)
    }

    /// `D` as a square matrix, computed on first access.
    pub fn diagonal_matrix(&self) -> Result<&Matrix<T>, LinalgError> {
        self.ensure_defined()?;
        Ok(self.diagonal_matrix.get_or_init(|| Matrix::from_diagonal(&self.d)))
    }

    /// `det(A) = Π L[i][i]² · Π D[i]`.
    pub fn det(&self) -> Result<T, LinalgError> {
        self.ensure_defined()?;
        let n = self.l.nrows();
        Ok((0..n).fold(T::one(), |acc, i| {
            let lii = self.l[(i, i)];
            acc * lii * lii * self.d[i]
        }))
    }

    /// `ln det(A) = 2·Σ ln L[i][i] + Σ ln D[i]`.
    ///
    /// Does not overflow where [`det`](Self::det) would.
    pub fn ln_det(&self) -> Result<T, LinalgError> {
        self.ensure_defined()?;
        let n = self.l.nrows();
        let two = T::one() + T::one();
        Ok((0..n).fold(T::zero(), |acc, i| {
            acc + two * self.l[(i, i)].ln() + self.d[i].ln()
        }))
    }

    /// Diagonal of `A⁻¹` without forming the inverse.
    pub fn inverse_diagonal(&self) -> Result<Vec<T>, LinalgError> {
        self.ensure_defined()?;
        Ok(inverse_diagonal_of(self.l.clone(), &self.d))
    }

    /// Like [`inverse_diagonal`](Self::inverse_diagonal), but inverts `L` in
    /// the factorization's own storage.
    pub fn into_inverse_diagonal(self) -> Result<Vec<T>, LinalgError> {
        self.ensure_defined()?;
        Ok(inverse_diagonal_of(self.l, &self.d))
    }

    /// `trace(A⁻¹)`.
    pub fn trace_of_inverse(&self) -> Result<T, LinalgError> {
        Ok(self.inverse_diagonal()?.into_iter().fold(T::zero(), |a, b| a + b))
    }

    /// Like [`trace_of_inverse`](Self::trace_of_inverse), consuming the
    /// factorization.
    pub fn into_trace_of_inverse(self) -> Result<T, LinalgError> {
        Ok(self.into_inverse_diagonal()?.into_iter().fold(T::zero(), |a, b| a + b))
    }

    /// Whether every pivot passed the positive-definite checks.
    pub fn is_positive_definite(&self) -> bool {
        self.positive_definite
    }

    /// Whether a soft path hit an exactly-zero pivot.
    pub fn is_undefined(&self) -> bool {
        self.state == FactorState::Undefined
    }

    /// Whether this is an `L·D·Lᵗ` factorization.
    pub fn is_ldlt(&self) -> bool {
        self.ldlt
    }

    /// Solve in place on the columns of `x`: `L`, then `D`, then `Lᵗ`.
    fn substitute(&self, x: &mut Matrix<T>) {
        let n = self.l.nrows();
        for c in 0..x.ncols() {
            let col = x.col_as_mut_slice(c, 0);
            for k in 0..n {
                col[k] = col[k] / self.l[(k, k)];
                let xk = col[k];
                for (y, &l) in col[k + 1..].iter_mut().zip(self.l.col_as_slice(k, k + 1)) {
                    *y = *y - xk * l;
                }
            }
            if self.ldlt {
                for (y, &dk) in col.iter_mut().zip(&self.d) {
                    *y = *y / dk;
                }
            }
            for k in (0..n).rev() {
                let s = self
                    .l
                    .col_as_slice(k, k + 1)
                    .iter()
                    .zip(&col[k + 1..])
                    .fold(T::zero(), |acc, (&l, &y)| acc + l * y);
                col[k] = (col[k] - s) / self.l[(k, k)];
            }
        }
    }
}

impl<T: FloatScalar> Solver<T> for CholeskyDecomposition<T> {
    fn nrows(&self) -> usize {
        self.l.nrows()
    }

    fn ncols(&self) -> usize {
        self.l.ncols()
    }

    fn solve(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        self.ensure_defined()?;
        check_rows(b, self.l.nrows())?;
        if !self.is_non_singular() {
            return Err(LinalgError::Singular);
        }
        let mut x = b.clone();
        self.substitute(&mut x);
        Ok(x)
    }

    /// `A` is symmetric, so `X·A = B` is `A·Xᵗ = Bᵗ`.
    fn solve_transpose(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
        check_cols(b, self.l.nrows())?;
        Ok(self.solve(&b.transpose())?.transpose())
    }

    fn reverse(&self) -> Result<Matrix<T>, LinalgError> {
        let lt = self.lt()?;
        let n = self.l.nrows();
        let mut ld = self.l.clone();
        if self.ldlt {
            for k in 0..n {
                let dk = self.d[k];
                for x in ld.col_as_mut_slice(k, 0) {
                    *x = *x * dk;
                }
            }
        }
        Ok(&ld * lt)
    }

    /// `A` is symmetric, so `(AᵗA)⁻¹ = A⁻¹·A⁻¹`.
    fn information_matrix(&self) -> Result<Matrix<T>, LinalgError> {
        let inv = self.inverse()?;
        Ok(&inv * &inv)
    }

    fn is_non_singular(&self) -> bool {
        self.state == FactorState::Valid && (self.ldlt || self.positive_definite)
    }

    fn is_full_rank(&self) -> bool {
        self.is_non_singular()
    }
}
