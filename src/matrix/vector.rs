use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::traits::{FloatScalar, Scalar};

use super::Matrix;

/// Dynamically-sized column vector.
///
/// Provides single-index access `v[i]`. Converts losslessly to and from an
/// `n x 1` [`Matrix`], which is how the solvers treat right-hand sides.
///
/// # Examples
///
/// ```
/// use linfact::Vector;
///
/// let v = Vector::from_slice(&[1.0_f64, 2.0, 3.0]);
/// assert_eq!(v[0], 1.0);
/// assert_eq!(v.len(), 3);
/// assert!((v.dot(&v) - 14.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T: Scalar> Vector<T> {
    /// Create a vector from a flat slice.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Create a vector from an owned `Vec`.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Create a zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![T::zero(); n],
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dot product.
    ///
    /// ```
    /// use linfact::Vector;
    /// let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
    /// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b), 32.0);
    /// ```
    pub fn dot(&self, rhs: &Self) -> T {
        assert_eq!(self.len(), rhs.len(), "vector length mismatch");
        self.data
            .iter()
            .zip(rhs.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
    }

    /// View the vector data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// View the vector data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T: FloatScalar> Vector<T> {
    /// Euclidean norm, accumulated with `hypot` so it cannot overflow.
    ///
    /// ```
    /// use linfact::Vector;
    /// let v = Vector::from_slice(&[3.0_f64, 4.0]);
    /// assert!((v.norm() - 5.0).abs() < 1e-12);
    /// ```
    pub fn norm(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc.hypot(x))
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<usize> for Vector<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for Vector<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

// ── Conversions: Vector ↔ Matrix ────────────────────────────────────

impl<T: Scalar> From<Vector<T>> for Matrix<T> {
    /// Reinterpret as an `n x 1` column matrix without copying.
    fn from(v: Vector<T>) -> Self {
        let n = v.len();
        Matrix::from_vec(n, 1, v.data)
    }
}

impl<T: Scalar> From<&Vector<T>> for Matrix<T> {
    fn from(v: &Vector<T>) -> Self {
        Matrix::from_slice(v.len(), 1, &v.data)
    }
}

impl<T: Scalar> Matrix<T> {
    /// Copy column `j` into a [`Vector`].
    ///
    /// ```
    /// use linfact::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.col(1).as_slice(), &[2.0, 4.0]);
    /// ```
    pub fn col(&self, j: usize) -> Vector<T> {
        assert!(j < self.ncols, "column {} out of range for {} columns", j, self.ncols);
        let start = j * self.nrows;
        Vector::from_slice(&self.data[start..start + self.nrows])
    }

    /// Copy row `i` into a [`Vector`].
    ///
    /// ```
    /// use linfact::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.row(1).as_slice(), &[3.0, 4.0]);
    /// ```
    pub fn row(&self, i: usize) -> Vector<T> {
        assert!(i < self.nrows, "row {} out of range for {} rows", i, self.nrows);
        Vector::from_vec((0..self.ncols).map(|j| self[(i, j)]).collect())
    }

    /// Consume an `n x 1` matrix and return it as a [`Vector`].
    ///
    /// Panics if the matrix has more than one column.
    pub fn into_col_vector(self) -> Vector<T> {
        assert_eq!(self.ncols, 1, "expected a single column, got {}", self.ncols);
        Vector::from_vec(self.data)
    }
}
