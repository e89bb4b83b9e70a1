use crate::traits::{FloatScalar, Scalar};

use super::{Matrix, Vector};

impl<T: Scalar> Matrix<T> {
    /// Transpose: (M×N) → (N×M).
    ///
    /// ```
    /// use linfact::Matrix;
    /// let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = a.transpose();
    /// assert_eq!(t.shape(), (3, 2));
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Self {
        Matrix::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)])
    }

    /// Square diagonal matrix from a slice.
    pub fn from_diagonal(d: &[T]) -> Self {
        let mut m = Self::zeros(d.len(), d.len());
        for (i, &x) in d.iter().enumerate() {
            m[(i, i)] = x;
        }
        m
    }

    /// Main diagonal as a [`Vector`].
    pub fn diagonal(&self) -> Vector<T> {
        let n = self.nrows.min(self.ncols);
        Vector::from_vec((0..n).map(|i| self[(i, i)]).collect())
    }

    /// Sum of diagonal elements.
    pub fn trace(&self) -> T {
        let n = self.nrows.min(self.ncols);
        (0..n).fold(T::zero(), |acc, i| acc + self[(i, i)])
    }

    /// Copy of the `rows x cols` block starting at `(i, j)`.
    ///
    /// ```
    /// use linfact::Matrix;
    /// let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    /// let b = a.block(1, 1, 2, 2);
    /// assert_eq!(b, Matrix::from_rows(2, 2, &[5.0, 6.0, 8.0, 9.0]));
    /// ```
    pub fn block(&self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        assert!(
            i + rows <= self.nrows && j + cols <= self.ncols,
            "block {}x{} at ({}, {}) exceeds {}x{} matrix",
            rows,
            cols,
            i,
            j,
            self.nrows,
            self.ncols,
        );
        Matrix::from_fn(rows, cols, |r, c| self[(i + r, j + c)])
    }

    /// Mutable views of two distinct columns.
    pub(crate) fn cols_mut(&mut self, a: usize, b: usize) -> (&mut [T], &mut [T]) {
        assert_ne!(a, b, "column pair must be distinct");
        let m = self.nrows;
        if a < b {
            let (lo, hi) = self.data.split_at_mut(b * m);
            (&mut lo[a * m..(a + 1) * m], &mut hi[..m])
        } else {
            let (lo, hi) = self.data.split_at_mut(a * m);
            (&mut hi[..m], &mut lo[b * m..(b + 1) * m])
        }
    }

    /// Swap two columns in place.
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a != b {
            let m = self.nrows;
            for i in 0..m {
                self.data.swap(a * m + i, b * m + i);
            }
        }
    }
}

impl<T: FloatScalar> Matrix<T> {
    /// Frobenius norm, accumulated with `hypot`.
    ///
    /// ```
    /// use linfact::Matrix;
    /// let a = Matrix::from_rows(2, 2, &[3.0_f64, 0.0, 0.0, 4.0]);
    /// assert!((a.frobenius_norm() - 5.0).abs() < 1e-12);
    /// ```
    pub fn frobenius_norm(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc.hypot(x))
    }

    /// Largest element-wise absolute difference between two equally shaped
    /// matrices. Infinite when the shapes differ.
    pub fn max_abs_diff(&self, other: &Self) -> T {
        if self.shape() != other.shape() {
            return T::infinity();
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc.max((a - b).abs()))
    }

    /// Whether any element is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|x| !x.is_finite())
    }
}
