//! Matrix-exponential façade.
//!
//! One entry point, three backends: materialize `exp(A δ)` densely, run a
//! sparsity-preserving Padé approximant, or defer everything behind a
//! [`LazyMatrixExp`] and answer row/column queries on demand.

use std::rc::Rc;

use ndarray::Array2;

use flowpipe_mat::{expm, padm, CsrMatrix, LazyMatrixExp, Matrix};
use flowpipe_sets::{linear_map, linear_map_exp, SetRc};

use crate::error::EngineError;

/// Degree of the sparse Padé approximant.
const PADE_DEGREE: usize = 8;

/// How `exp(A δ)` is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpMode {
    /// Materialize through dense scaling-and-squaring.
    #[default]
    Dense,
    /// Padé approximant in sparse arithmetic.
    Pade,
    /// Never materialize; extract rows/columns on demand.
    Lazy,
}

/// `exp(A δ)` in one of three representations.
#[derive(Debug, Clone)]
pub enum MatrixExp {
    Dense(Array2<f64>),
    Sparse(CsrMatrix),
    Lazy(LazyMatrixExp),
}

impl MatrixExp {
    /// Side length.
    pub fn dim(&self) -> usize {
        match self {
            MatrixExp::Dense(m) => m.nrows(),
            MatrixExp::Sparse(m) => m.nrows(),
            MatrixExp::Lazy(e) => e.dim(),
        }
    }

    /// `Φ · S` as a lazy set, without materializing a lazy exponential.
    pub fn map_set(&self, set: SetRc) -> SetRc {
        match self {
            MatrixExp::Dense(m) => linear_map(Rc::new(Matrix::Dense(m.clone())), set),
            MatrixExp::Sparse(m) => linear_map(Rc::new(Matrix::Sparse(m.clone())), set),
            MatrixExp::Lazy(e) => linear_map_exp(Rc::new(e.clone()), set),
        }
    }

    /// Extract the sub-block `[rows, cols]` as a concrete matrix. For the
    /// lazy backend only the touched rows are materialized.
    pub fn block(&self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Matrix {
        match self {
            MatrixExp::Dense(m) => {
                Matrix::Dense(m.slice(ndarray::s![rows, cols]).to_owned())
            }
            MatrixExp::Sparse(m) => Matrix::Sparse(m.block(rows, cols)),
            MatrixExp::Lazy(e) => {
                let r = e.rows(rows);
                Matrix::Dense(r.slice(ndarray::s![.., cols]).to_owned())
            }
        }
    }

    /// Extract the column range `[.., cols]`. The lazy backend materializes
    /// exactly those columns.
    pub fn columns(&self, cols: std::ops::Range<usize>) -> Matrix {
        match self {
            MatrixExp::Dense(m) => Matrix::Dense(m.slice(ndarray::s![.., cols]).to_owned()),
            MatrixExp::Sparse(m) => Matrix::Sparse(m.block(0..m.nrows(), cols)),
            MatrixExp::Lazy(e) => Matrix::Dense(e.columns(cols)),
        }
    }
}

/// Compute `exp(A δ)` under the selected mode.
pub fn expmat(a: &Matrix, delta: f64, mode: ExpMode) -> Result<MatrixExp, EngineError> {
    if !a.is_square() {
        return Err(EngineError::DimensionMismatch(format!(
            "exponential of a {}x{} matrix",
            a.nrows(),
            a.ncols()
        )));
    }
    let scaled = a.scale(delta);
    match mode {
        ExpMode::Dense => Ok(MatrixExp::Dense(expm(&scaled.to_dense())?)),
        ExpMode::Pade => Ok(MatrixExp::Sparse(padm(&scaled.to_sparse(), PADE_DEGREE)?)),
        ExpMode::Lazy => Ok(MatrixExp::Lazy(LazyMatrixExp::new(scaled.to_sparse()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::Sparse(CsrMatrix::from_triplets(
            3,
            3,
            &[(0, 0, 1.0), (0, 1, -0.5), (1, 2, 0.7), (2, 1, 0.3)],
        ))
    }

    #[test]
    fn three_backends_agree_on_blocks() {
        let a = sample();
        let delta = 0.05;
        let dense = expmat(&a, delta, ExpMode::Dense).unwrap();
        let pade = expmat(&a, delta, ExpMode::Pade).unwrap();
        let lazy = expmat(&a, delta, ExpMode::Lazy).unwrap();

        let d = dense.block(0..2, 1..3).to_dense();
        let p = pade.block(0..2, 1..3).to_dense();
        let l = lazy.block(0..2, 1..3).to_dense();
        for i in 0..2 {
            for j in 0..2 {
                assert!((d[(i, j)] - p[(i, j)]).abs() < 1e-9);
                assert!((d[(i, j)] - l[(i, j)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn columns_match_across_backends() {
        let a = sample();
        let dense = expmat(&a, 0.1, ExpMode::Dense).unwrap();
        let lazy = expmat(&a, 0.1, ExpMode::Lazy).unwrap();
        let d = dense.columns(1..3).to_dense();
        let l = lazy.columns(1..3).to_dense();
        for i in 0..3 {
            for j in 0..2 {
                assert!((d[(i, j)] - l[(i, j)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn map_set_over_identity_exponential() {
        use flowpipe_sets::concrete::ball2;
        use flowpipe_sets::LazySet;
        // exp(0) = I, so mapping leaves supports unchanged.
        let zero = Matrix::Sparse(CsrMatrix::zeros(2, 2));
        let phi = expmat(&zero, 1.0, ExpMode::Dense).unwrap();
        let s = phi.map_set(ball2(vec![1.0, 0.0], 0.5));
        assert!((s.support(&[1.0, 0.0]) - 1.5).abs() < 1e-12);
    }
}
