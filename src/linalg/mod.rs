mod cached;
pub(crate) mod cholesky;
pub(crate) mod qr;
pub(crate) mod solver;
pub(crate) mod svd;

pub use cholesky::{CholeskyDecomposition, CholeskyOptions};
pub use qr::{QrDecomposition, QrOptions};
pub use solver::Solver;
pub use svd::{SvdDecomposition, SvdOptions};

/// Errors from factorization and solve operations.
///
/// Returned by decomposition constructors and by every [`Solver`] method.
/// Numeric payloads are reported as `f64` regardless of the element type.
///
/// ```
/// use linfact::{CholeskyDecomposition, LinalgError, Matrix};
///
/// let not_square: Matrix<f64> = Matrix::zeros(2, 3);
/// assert_eq!(
///     CholeskyDecomposition::new(&not_square).unwrap_err(),
///     LinalgError::NotSquare { rows: 2, cols: 3 },
/// );
///
/// let not_pd = Matrix::from_rows(2, 2, &[1.0_f64, 5.0, 5.0, 1.0]);
/// assert!(matches!(
///     CholeskyDecomposition::new(&not_pd).unwrap_err(),
///     LinalgError::NotPositiveDefinite { pivot: 1, .. },
/// ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinalgError {
    /// A square matrix was required.
    NotSquare { rows: usize, cols: usize },
    /// Operand shape does not match the decomposed matrix.
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// `A[row][col]` and `A[col][row]` differ by more than the relative
    /// symmetry threshold; `excess` is by how much.
    NotSymmetric { row: usize, col: usize, excess: f64 },
    /// Pivot `pivot` fell below the positivity threshold.
    NotPositiveDefinite { pivot: usize, value: f64 },
    /// The factorization is rank deficient and cannot solve exactly.
    RankDeficient,
    /// Matrix is singular.
    Singular,
    /// A soft factorization hit an exactly-zero pivot and holds no usable
    /// factor.
    Undefined,
    /// The requested factor was not computed (see [`SvdOptions`]).
    NotComputed { factor: &'static str },
    /// The SVD sweep exceeded its iteration ceiling on one singular value.
    ConvergenceFailure { iterations: usize },
}

impl core::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinalgError::NotSquare { rows, cols } => {
                write!(f, "matrix is not square ({}x{})", rows, cols)
            }
            LinalgError::DimensionMismatch { expected, got } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            LinalgError::NotSymmetric { row, col, excess } => write!(
                f,
                "matrix is not symmetric at ({}, {}): exceeds threshold by {:e}",
                row, col, excess
            ),
            LinalgError::NotPositiveDefinite { pivot, value } => write!(
                f,
                "matrix is not positive definite: pivot {} is {:e}",
                pivot, value
            ),
            LinalgError::RankDeficient => write!(f, "matrix is rank deficient"),
            LinalgError::Singular => write!(f, "matrix is singular"),
            LinalgError::Undefined => write!(f, "factorization is undefined"),
            LinalgError::NotComputed { factor } => {
                write!(f, "factor {} was not computed", factor)
            }
            LinalgError::ConvergenceFailure { iterations } => write!(
                f,
                "singular value sweep did not converge after {} iterations",
                iterations
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinalgError {}
