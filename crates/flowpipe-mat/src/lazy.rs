//! Lazy matrix exponential.
//!
//! `LazyMatrixExp` stores only the exponent `M` and answers queries about
//! `exp(M)` on demand: single rows, row ranges, and column ranges, each
//! materialized through [`expmv`](crate::expm::expmv) runs against the
//! *current* exponent. Advancing the represented power is therefore an
//! additive update of the exponent — after `advance(&other)` every query
//! answers against `exp(M + other)` exactly.

use ndarray::Array2;
use std::cell::RefCell;
use std::ops::Range;

use crate::expm::expmv;
use crate::sparse::CsrMatrix;

/// `exp(M)` represented by its exponent `M`, never materialized.
#[derive(Debug, Clone)]
pub struct LazyMatrixExp {
    exponent: CsrMatrix,
    /// Transpose of the exponent, built on the first row query and
    /// invalidated by `advance`. Row `i` of `exp(M)` is `exp(M^T) e_i`.
    transposed: RefCell<Option<CsrMatrix>>,
}

impl LazyMatrixExp {
    /// Wrap an exponent. The represented value is `exp(exponent)`.
    pub fn new(exponent: CsrMatrix) -> Self {
        debug_assert_eq!(exponent.nrows(), exponent.ncols());
        Self {
            exponent,
            transposed: RefCell::new(None),
        }
    }

    /// Side length of the represented exponential.
    pub fn dim(&self) -> usize {
        self.exponent.nrows()
    }

    /// The stored exponent.
    pub fn exponent(&self) -> &CsrMatrix {
        &self.exponent
    }

    /// Row `i` of `exp(M)`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        let n = self.dim();
        debug_assert!(i < n);
        let mut e = vec![0.0; n];
        e[i] = 1.0;
        self.with_transposed(|mt| expmv(1.0, mt, &e))
    }

    /// Rows `range` of `exp(M)` as a dense `range.len() x n` matrix.
    pub fn rows(&self, range: Range<usize>) -> Array2<f64> {
        let n = self.dim();
        debug_assert!(range.end <= n);
        let mut out = Array2::zeros((range.len(), n));
        for (t, i) in range.enumerate() {
            let row = self.row(i);
            for (j, v) in row.into_iter().enumerate() {
                out[(t, j)] = v;
            }
        }
        out
    }

    /// Column `j` of `exp(M)`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        let n = self.dim();
        debug_assert!(j < n);
        let mut e = vec![0.0; n];
        e[j] = 1.0;
        expmv(1.0, &self.exponent, &e)
    }

    /// Columns `range` of `exp(M)` as a dense `n x range.len()` matrix.
    pub fn columns(&self, range: Range<usize>) -> Array2<f64> {
        let n = self.dim();
        debug_assert!(range.end <= n);
        let mut out = Array2::zeros((n, range.len()));
        for (t, j) in range.enumerate() {
            let col = self.column(j);
            for (i, v) in col.into_iter().enumerate() {
                out[(i, t)] = v;
            }
        }
        out
    }

    /// `exp(M)^T x`, the shape of a support-function query against a set
    /// mapped by the lazy exponential.
    pub fn transpose_apply(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.dim());
        self.with_transposed(|mt| expmv(1.0, mt, x))
    }

    /// Add another generator into the exponent in place, so that subsequent
    /// queries answer against `exp(M + other)`. Advancing a power of
    /// `exp(A delta)` is `advance(&(A delta))`.
    pub fn advance(&mut self, other: &CsrMatrix) {
        debug_assert_eq!(other.nrows(), self.exponent.nrows());
        debug_assert_eq!(other.ncols(), self.exponent.ncols());
        self.exponent = self.exponent.add(other);
        self.transposed.replace(None);
    }

    fn with_transposed<R>(&self, f: impl FnOnce(&CsrMatrix) -> R) -> R {
        let mut cache = self.transposed.borrow_mut();
        let mt = cache.get_or_insert_with(|| self.exponent.transpose());
        f(mt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expm::expm;

    fn sample_exponent() -> CsrMatrix {
        CsrMatrix::from_triplets(
            4,
            4,
            &[(0, 0, 0.3), (0, 1, 0.5), (1, 1, -0.2), (2, 3, 0.8), (3, 2, -0.8)],
        )
    }

    #[test]
    fn rows_and_columns_match_dense_exponential() {
        let m = sample_exponent();
        let lazy = LazyMatrixExp::new(m.clone());
        let dense = expm(&m.to_dense()).unwrap();

        let rows = lazy.rows(1..3);
        for i in 0..2 {
            for j in 0..4 {
                assert!((rows[(i, j)] - dense[(i + 1, j)]).abs() < 1e-10);
            }
        }
        let cols = lazy.columns(0..2);
        for i in 0..4 {
            for j in 0..2 {
                assert!((cols[(i, j)] - dense[(i, j)]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn advance_doubles_the_exponent() {
        let m = sample_exponent();
        let mut lazy = LazyMatrixExp::new(m.clone());
        lazy.advance(&m);
        let squared = {
            let e = expm(&m.to_dense()).unwrap();
            e.dot(&e)
        };
        let row = lazy.row(0);
        for j in 0..4 {
            assert!((row[j] - squared[(0, j)]).abs() < 1e-9);
        }
    }

    #[test]
    fn transpose_apply_matches_row_combination() {
        let lazy = LazyMatrixExp::new(sample_exponent());
        let x = [1.0, 0.0, 2.0, 0.0];
        let direct = lazy.transpose_apply(&x);
        let row0 = lazy.row(0);
        let row2 = lazy.row(2);
        for j in 0..4 {
            assert!((direct[j] - (row0[j] + 2.0 * row2[j])).abs() < 1e-10);
        }
    }
}
