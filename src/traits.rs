use core::fmt::Debug;
use num_traits::{Float, Num, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for real floating-point matrix elements.
///
/// Required by every factorization. On top of [`Float`] (which already
/// provides the overflow-safe `hypot`, `sqrt`, `abs` and `epsilon`), it adds
/// the few constants the bidiagonal QR sweep and rank estimation need.
pub trait FloatScalar: Scalar + Float + Send + Sync + 'static {
    /// Underflow guard used by the negligibility tests of the SVD sweep.
    ///
    /// Keeps `|e| <= TINY + eps * (...)` meaningful when both diagonal
    /// neighbours have flushed to zero.
    const TINY: Self;

    /// Distance from `|self|` to the next larger representable value.
    fn ulp(self) -> Self;

    /// Lossy conversion to `f64`, used when reporting values in errors.
    fn to_report(self) -> f64;

    /// Lossy conversion from `f64`, used for option thresholds.
    fn cast_f64(x: f64) -> Self;
}

macro_rules! impl_float_scalar {
    ($t:ty, $tiny:expr) => {
        impl FloatScalar for $t {
            const TINY: $t = $tiny;

            #[inline]
            fn ulp(self) -> $t {
                let a = Float::abs(self);
                if !a.is_finite() {
                    return <$t>::NAN;
                }
                if a == <$t>::MAX {
                    return a - <$t>::from_bits(a.to_bits() - 1);
                }
                <$t>::from_bits(a.to_bits() + 1) - a
            }

            #[inline]
            fn to_report(self) -> f64 {
                self as f64
            }

            #[inline]
            fn cast_f64(x: f64) -> $t {
                x as $t
            }
        }
    };
}

// 2^-966 and 2^-120: a few hundred ulps above the subnormal range.
impl_float_scalar!(f64, 1.6033346880071782e-291);
impl_float_scalar!(f32, 7.523_163_8e-37);

/// Read-only access to a matrix-like type.
///
/// The factorization kernels are written against this trait rather than a
/// concrete container. `col_as_slice` relies on column-major storage.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;

    /// Contiguous view of `col` from `row_start` to the last row.
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T];
}

/// Mutable access to a matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling the in-place
/// kernels (Householder updates, Cholesky column sweeps) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Mutable contiguous view of `col` from `row_start` to the last row.
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T];

    /// Mutable view of column `dst` together with a shared view of column
    /// `src`, both starting at `row_start`. Requires `dst != src`.
    fn col_pair_mut(&mut self, dst: usize, src: usize, row_start: usize) -> (&mut [T], &[T]);
}
