use core::ops::{Add, Mul, Neg, Sub};

use crate::traits::Scalar;

use super::{Matrix, Vector};

impl<T: Scalar> Matrix<T> {
    fn zip_with(&self, rhs: &Self, op: &str, f: impl Fn(T, T) -> T) -> Self {
        assert_eq!(
            self.shape(),
            rhs.shape(),
            "dimension mismatch: {}x{} {} {}x{}",
            self.nrows,
            self.ncols,
            op,
            rhs.nrows,
            rhs.ncols,
        );
        Matrix {
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Matrix product `self * rhs`.
    ///
    /// Accumulates whole columns of `self` (axpy form) so the inner loop runs
    /// over contiguous storage.
    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let m = self.nrows;
        let mut out = Matrix::zeros(m, rhs.ncols);
        for j in 0..rhs.ncols {
            let dst = &mut out.data[j * m..(j + 1) * m];
            for k in 0..self.ncols {
                let b = rhs[(k, j)];
                if b == T::zero() {
                    continue;
                }
                let src = &self.data[k * m..(k + 1) * m];
                for (d, &a) in dst.iter_mut().zip(src) {
                    *d = *d + a * b;
                }
            }
        }
        out
    }

    /// `self^T * rhs` without materializing the transpose.
    ///
    /// ```
    /// use linfact::Matrix;
    /// let x = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
    /// let xtx = x.transpose_mul(&x);
    /// assert_eq!(xtx[(0, 0)], 3.0);
    /// assert_eq!(xtx[(0, 1)], 3.0);
    /// assert_eq!(xtx[(1, 1)], 5.0);
    /// ```
    pub fn transpose_mul(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.nrows, rhs.nrows,
            "dimension mismatch: ({}x{})^T * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let m = self.nrows;
        Matrix::from_fn(self.ncols, rhs.ncols, |i, j| {
            let a = &self.data[i * m..(i + 1) * m];
            let b = &rhs.data[j * m..(j + 1) * m];
            a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
        })
    }

    /// Matrix–vector product `self * v`.
    pub fn mul_vector(&self, v: &Vector<T>) -> Vector<T> {
        assert_eq!(
            self.ncols,
            v.len(),
            "dimension mismatch: {}x{} * vector of length {}",
            self.nrows,
            self.ncols,
            v.len(),
        );
        let m = self.nrows;
        let mut out = Vector::zeros(m);
        for (k, &x) in v.iter().enumerate() {
            let src = &self.data[k * m..(k + 1) * m];
            for (d, &a) in out.as_mut_slice().iter_mut().zip(src) {
                *d = *d + a * x;
            }
        }
        out
    }

    /// Multiply every element by `s`.
    pub fn scale(&self, s: T) -> Self {
        Matrix {
            data: self.data.iter().map(|&x| x * s).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

// ── Addition / subtraction ──────────────────────────────────────────

impl<T: Scalar> Add<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn add(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.zip_with(rhs, "+", |a, b| a + b)
    }
}

impl<T: Scalar> Add for Matrix<T> {
    type Output = Matrix<T>;
    fn add(self, rhs: Self) -> Matrix<T> {
        &self + &rhs
    }
}

impl<T: Scalar> Sub<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn sub(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.zip_with(rhs, "-", |a, b| a - b)
    }
}

impl<T: Scalar> Sub for Matrix<T> {
    type Output = Matrix<T>;
    fn sub(self, rhs: Self) -> Matrix<T> {
        &self - &rhs
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for Matrix<T> {
    type Output = Matrix<T>;
    fn neg(mut self) -> Matrix<T> {
        for x in self.data.iter_mut() {
            *x = -*x;
        }
        self
    }
}

// ── Products ────────────────────────────────────────────────────────

impl<T: Scalar> Mul<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.matmul(rhs)
    }
}

impl<T: Scalar> Mul for Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: Self) -> Matrix<T> {
        self.matmul(&rhs)
    }
}

impl<T: Scalar> Mul<&Vector<T>> for &Matrix<T> {
    type Output = Vector<T>;
    fn mul(self, rhs: &Vector<T>) -> Vector<T> {
        self.mul_vector(rhs)
    }
}

impl<T: Scalar> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: T) -> Matrix<T> {
        self.scale(rhs)
    }
}
