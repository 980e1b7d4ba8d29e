#![doc = include_str!("../README.md")]

//! Matrix layer: dense (`ndarray`) and CSR sparse matrices, the `Matrix`
//! sum type used across the workspace, matrix exponentials, and the lazy
//! exponential with row/column extraction.

pub mod dense;
pub mod expm;
pub mod lazy;
pub mod matrix;
pub mod sparse;

pub use dense::{lu_solve, mat_mul_into, norm_inf_dense};
pub use expm::{expm, expmv, padm};
pub use lazy::LazyMatrixExp;
pub use matrix::Matrix;
pub use sparse::CsrMatrix;

use thiserror::Error;

/// Errors raised by the matrix layer.
#[derive(Debug, Error)]
pub enum MatError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("matrix is singular (pivot {pivot:e} at column {col})")]
    Singular { pivot: f64, col: usize },
}
