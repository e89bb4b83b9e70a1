use crate::linalg::LinalgError;
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// Uniform solving interface shared by every factorization.
///
/// Object safe, so callers can hold a `&dyn Solver<T>` and swap the
/// decomposition behind it (for example falling back to an SVD after a
/// Cholesky failure).
///
/// ```
/// use linfact::{Matrix, QrDecomposition, Solver, SvdDecomposition};
///
/// let a = Matrix::from_rows(2, 2, &[4.0_f64, 1.0, 1.0, 3.0]);
/// let qr = QrDecomposition::new(&a);
/// let svd = SvdDecomposition::new(&a).unwrap();
/// let solvers: [&dyn Solver<f64>; 2] = [&qr, &svd];
/// for s in solvers {
///     let inv = s.inverse().unwrap();
///     let id = &a * &inv;
///     assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
///     assert!(id[(0, 1)].abs() < 1e-12);
/// }
/// ```
pub trait Solver<T: FloatScalar> {
    /// Rows of the decomposed matrix.
    fn nrows(&self) -> usize;

    /// Columns of the decomposed matrix.
    fn ncols(&self) -> usize;

    /// Solve `A·X = B`. Least squares when `A` has more rows than columns.
    fn solve(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError>;

    /// Solve `A·x = b` for a single right-hand side.
    fn solve_vector(&self, b: &Vector<T>) -> Result<Vector<T>, LinalgError> {
        self.solve(&Matrix::from(b)).map(Matrix::into_col_vector)
    }

    /// Solve `X·A = B`.
    fn solve_transpose(&self, b: &Matrix<T>) -> Result<Matrix<T>, LinalgError>;

    /// `A⁻¹`, or the least-squares left inverse for tall input.
    fn inverse(&self) -> Result<Matrix<T>, LinalgError> {
        self.solve(&Matrix::eye(self.nrows()))
    }

    /// Reconstruct the decomposed matrix from its factors.
    fn reverse(&self) -> Result<Matrix<T>, LinalgError>;

    /// `(XᵗX)⁻¹` where `X` is the decomposed matrix.
    fn information_matrix(&self) -> Result<Matrix<T>, LinalgError>;

    fn is_non_singular(&self) -> bool;

    fn is_full_rank(&self) -> bool;
}

/// Square input check; returns the dimension.
#[inline]
pub(crate) fn check_square<T>(a: &Matrix<T>) -> Result<usize, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::NotSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(a.nrows())
}

/// Shape check for right-hand sides of `A·X = B`.
#[inline]
pub(crate) fn check_rows<T>(b: &Matrix<T>, expected: usize) -> Result<(), LinalgError> {
    if b.nrows() != expected {
        return Err(LinalgError::DimensionMismatch {
            expected: (expected, b.ncols()),
            got: b.shape(),
        });
    }
    Ok(())
}

/// Shape check for right-hand sides of `X·A = B`.
#[inline]
pub(crate) fn check_cols<T>(b: &Matrix<T>, expected: usize) -> Result<(), LinalgError> {
    if b.ncols() != expected {
        return Err(LinalgError::DimensionMismatch {
            expected: (b.nrows(), expected),
            got: b.shape(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_check_reports_both_shapes() {
        let b: Matrix<f64> = Matrix::zeros(2, 3);
        assert_eq!(check_rows(&b, 2), Ok(()));
        assert_eq!(
            check_rows(&b, 4),
            Err(LinalgError::DimensionMismatch {
                expected: (4, 3),
                got: (2, 3)
            })
        );
    }

    #[test]
    fn col_check() {
        let b: Matrix<f64> = Matrix::zeros(2, 3);
        assert_eq!(check_cols(&b, 3), Ok(()));
        assert!(check_cols(&b, 2).is_err());
    }
}
