//! # linfact
//!
//! Dense matrix factorizations in pure Rust, no-std compatible (with `alloc`).
//! Cholesky, Householder QR and the Golub-Kahan SVD share one [`Solver`]
//! interface, so code that solves, inverts or reconstructs can be written
//! once and handed whichever decomposition fits the input.
//!
//! ## Quick start
//!
//! ```
//! use linfact::{CholeskyDecomposition, Matrix, Solver};
//!
//! // Solve a symmetric positive-definite system A·x = b
//! let a = Matrix::from_rows(3, 3, &[
//!     4.0_f64, 2.0, 0.0,
//!     2.0, 5.0, 1.0,
//!     0.0, 1.0, 3.0,
//! ]);
//! let b = Matrix::from_rows(3, 1, &[2.0, 6.0, 4.0]);
//! let chol = CholeskyDecomposition::new(&a).unwrap();
//! let x = chol.solve(&b).unwrap();
//! assert!((&a * &x).max_abs_diff(&b) < 1e-12);
//! assert!((chol.det().unwrap() - 44.0).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`] — Heap-allocated `Matrix<T>` with runtime dimensions and
//!   column-major storage, plus a `Vector<T>` for single right-hand sides.
//!   Implements [`MatrixRef`] / [`MatrixMut`], which the factorization
//!   kernels are written against.
//!
//! - [`linalg`] — The decompositions and the [`Solver`] trait:
//!   - [`CholeskyDecomposition`] — strict `LLᵗ` with symmetry and positivity
//!     checks, plus soft `LLᵗ` and `LDLᵗ` variants that never reject input.
//!   - [`QrDecomposition`] — Householder `A = QR` for any shape, with
//!     least-squares solving and an economy/full `Q`.
//!   - [`SvdDecomposition`] — thin `A = UΣVᵗ`, rank, condition number and
//!     pseudo-inverse solves.
//!
//! - [`parallel`] — [`Parallelism`] selects whether the Cholesky trailing
//!   updates fan out over a rayon pool.
//!
//! - [`traits`] — Element trait hierarchy:
//!   - [`Scalar`] — all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`] — `f32` / `f64`, used by every factorization
//!   - [`MatrixRef`] / [`MatrixMut`] — generic read/write access for algorithms
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade under the
//! `linfact` target: rejected inputs at `debug`, undefined factors and SVD
//! iteration failures at `warn`, per-value SVD convergence at `trace`.
//! Nothing is printed unless the application installs a logger.
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Hardware FPU via system libm, `std::error::Error` impl, thread-safe caches |
//! | `libm`    | no       | Pure-Rust software float fallback for `no_std` |
//! | `rayon`   | no       | `Parallelism::Rayon` for Cholesky trailing updates (implies `std`) |

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod linalg;
pub mod matrix;
pub mod parallel;
pub mod traits;

pub use linalg::{
    CholeskyDecomposition, CholeskyOptions, LinalgError, QrDecomposition, QrOptions, Solver,
    SvdDecomposition, SvdOptions,
};
pub use matrix::{Matrix, Vector};
pub use parallel::Parallelism;
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};
