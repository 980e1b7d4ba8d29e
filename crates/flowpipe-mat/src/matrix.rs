//! The `Matrix` sum type: one value that is either dense or CSR.
//!
//! System matrices and extracted exponential blocks flow through the engine
//! in whichever representation they were built in; dispatch is by variant.

use ndarray::Array2;
use std::ops::Range;

use crate::dense;
use crate::sparse::CsrMatrix;

/// A real matrix, dense or sparse.
#[derive(Debug, Clone)]
pub enum Matrix {
    Dense(Array2<f64>),
    Sparse(CsrMatrix),
}

impl Matrix {
    pub fn nrows(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.nrows(),
            Matrix::Sparse(a) => a.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.ncols(),
            Matrix::Sparse(a) => a.ncols(),
        }
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    /// Infinity norm (maximum absolute row sum).
    pub fn norm_inf(&self) -> f64 {
        match self {
            Matrix::Dense(a) => dense::norm_inf_dense(a),
            Matrix::Sparse(a) => a.norm_inf(),
        }
    }

    /// Entry-wise absolute value, preserving the representation.
    pub fn abs(&self) -> Matrix {
        match self {
            Matrix::Dense(a) => Matrix::Dense(a.mapv(f64::abs)),
            Matrix::Sparse(a) => Matrix::Sparse(a.abs()),
        }
    }

    /// Scale every entry by `factor`, preserving the representation.
    pub fn scale(&self, factor: f64) -> Matrix {
        match self {
            Matrix::Dense(a) => Matrix::Dense(a.mapv(|x| x * factor)),
            Matrix::Sparse(a) => Matrix::Sparse(a.scale(factor)),
        }
    }

    /// Matrix product. Mixed representations fall back to dense.
    pub fn mat_mul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.ncols(), other.nrows());
        match (self, other) {
            (Matrix::Sparse(a), Matrix::Sparse(b)) => Matrix::Sparse(a.mat_mul(b)),
            _ => Matrix::Dense(self.to_dense().dot(&other.to_dense())),
        }
    }

    /// `y = self * x`.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.ncols());
        match self {
            Matrix::Dense(a) => a
                .rows()
                .into_iter()
                .map(|row| row.iter().zip(x).map(|(v, xv)| v * xv).sum())
                .collect(),
            Matrix::Sparse(a) => a.mat_vec(x),
        }
    }

    /// `y = self^T * x` without forming the transpose; this is the shape of
    /// every support-function query against a linearly mapped set.
    pub fn transpose_apply(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.nrows());
        match self {
            Matrix::Dense(a) => {
                let mut y = vec![0.0; a.ncols()];
                for (r, row) in a.rows().into_iter().enumerate() {
                    let xr = x[r];
                    if xr == 0.0 {
                        continue;
                    }
                    for (c, v) in row.iter().enumerate() {
                        y[c] += v * xr;
                    }
                }
                y
            }
            Matrix::Sparse(a) => a.transpose_mat_vec(x),
        }
    }

    /// Extract the sub-block `self[rows, cols]`, preserving the representation.
    pub fn block(&self, rows: Range<usize>, cols: Range<usize>) -> Matrix {
        match self {
            Matrix::Dense(a) => Matrix::Dense(dense::block(a, rows, cols)),
            Matrix::Sparse(a) => Matrix::Sparse(a.block(rows, cols)),
        }
    }

    /// True iff the sub-block `self[rows, cols]` holds no nonzero entry.
    pub fn block_is_zero(&self, rows: Range<usize>, cols: Range<usize>) -> bool {
        match self {
            Matrix::Dense(a) => a
                .slice(ndarray::s![rows, cols])
                .iter()
                .all(|&v| v == 0.0),
            Matrix::Sparse(a) => a.block_is_zero(rows, cols),
        }
    }

    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            Matrix::Dense(a) => a.clone(),
            Matrix::Sparse(a) => a.to_dense(),
        }
    }

    /// CSR view of the matrix, converting if dense.
    pub fn to_sparse(&self) -> CsrMatrix {
        match self {
            Matrix::Dense(a) => CsrMatrix::from_dense(a),
            Matrix::Sparse(a) => a.clone(),
        }
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(a: Array2<f64>) -> Self {
        Matrix::Dense(a)
    }
}

impl From<CsrMatrix> for Matrix {
    fn from(a: CsrMatrix) -> Self {
        Matrix::Sparse(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn transpose_apply_matches_dense_transpose() {
        let d = arr2(&[[1.0, 2.0, 0.0], [0.0, 3.0, 4.0]]);
        let m = Matrix::Dense(d.clone());
        let s = Matrix::Sparse(CsrMatrix::from_dense(&d));
        let x = [2.0, -1.0];
        let expected = vec![2.0, 1.0, -4.0];
        assert_eq!(m.transpose_apply(&x), expected);
        assert_eq!(s.transpose_apply(&x), expected);
    }

    #[test]
    fn mixed_mat_mul_goes_dense() {
        let a = Matrix::Dense(arr2(&[[1.0, 0.0], [0.0, 2.0]]));
        let b = Matrix::Sparse(CsrMatrix::identity(2));
        match a.mat_mul(&b) {
            Matrix::Dense(p) => assert_eq!(p, arr2(&[[1.0, 0.0], [0.0, 2.0]])),
            Matrix::Sparse(_) => panic!("expected dense product"),
        }
    }

    #[test]
    fn block_preserves_representation() {
        let s = Matrix::Sparse(CsrMatrix::identity(4));
        assert!(matches!(s.block(0..2, 0..2), Matrix::Sparse(_)));
        assert!(s.block_is_zero(0..2, 2..4));
    }
}
