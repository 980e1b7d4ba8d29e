//! Compressed sparse row matrices.
//!
//! The engine only needs a small surface: construction from triplets,
//! matrix-vector and matrix-matrix products, block slicing with a cheap
//! all-zero test, transposition, and a handful of element-wise maps. Rows
//! keep their column indices sorted, which makes block extraction and the
//! zero test binary-search friendly.

use ndarray::Array2;
use std::ops::Range;

/// A real matrix in CSR form.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    nrows: usize,
    ncols: usize,
    /// Row pointer, length `nrows + 1`.
    indptr: Vec<usize>,
    /// Column index per stored entry, sorted within each row.
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Build from `(row, col, value)` triplets; duplicates are summed and
    /// exact zeros dropped.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut entries: Vec<(usize, usize, f64)> = triplets
            .iter()
            .copied()
            .filter(|&(r, c, v)| {
                debug_assert!(r < nrows && c < ncols, "triplet ({r},{c}) out of bounds");
                v != 0.0
            })
            .collect();
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut indptr = vec![0usize; nrows + 1];
        let mut indices = Vec::with_capacity(entries.len());
        let mut data: Vec<f64> = Vec::with_capacity(entries.len());
        let mut prev: Option<(usize, usize)> = None;

        for (r, c, v) in entries {
            if prev == Some((r, c)) {
                if let Some(last) = data.last_mut() {
                    *last += v;
                }
                continue;
            }
            indices.push(c);
            data.push(v);
            indptr[r + 1] += 1;
            prev = Some((r, c));
        }
        for r in 0..nrows {
            indptr[r + 1] += indptr[r];
        }

        let mut m = Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        };
        m.drop_zeros();
        m
    }

    /// The `n`-dimensional identity.
    pub fn identity(n: usize) -> Self {
        let triplets: Vec<_> = (0..n).map(|i| (i, i, 1.0)).collect();
        Self::from_triplets(n, n, &triplets)
    }

    /// All-zero matrix of the given shape.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; nrows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// The standard projection onto a contiguous coordinate range: a
    /// `range.len() x ncols` matrix with ones at `(t, range.start + t)`.
    pub fn projection(range: Range<usize>, ncols: usize) -> Self {
        debug_assert!(range.end <= ncols);
        let triplets: Vec<_> = range
            .clone()
            .enumerate()
            .map(|(t, col)| (t, col, 1.0))
            .collect();
        Self::from_triplets(range.len(), ncols, &triplets)
    }

    /// Convert a dense matrix, dropping exact zeros.
    pub fn from_dense(a: &Array2<f64>) -> Self {
        let mut triplets = Vec::new();
        for ((r, c), &v) in a.indexed_iter() {
            if v != 0.0 {
                triplets.push((r, c, v));
            }
        }
        Self::from_triplets(a.nrows(), a.ncols(), &triplets)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored entry at `(i, j)`, or zero.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let row = &self.indices[self.indptr[i]..self.indptr[i + 1]];
        match row.binary_search(&j) {
            Ok(pos) => self.data[self.indptr[i] + pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate the stored entries of row `i` as `(col, value)` pairs.
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.indptr[i]..self.indptr[i + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.data[span].iter().copied())
    }

    /// Iterate all stored entries as `(row, col, value)` triplets.
    pub fn triplet_iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.nrows).flat_map(move |r| self.row_iter(r).map(move |(c, v)| (r, c, v)))
    }

    /// `y = self * x`.
    pub fn mat_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.ncols);
        let mut y = vec![0.0; self.nrows];
        for r in 0..self.nrows {
            let mut acc = 0.0;
            for (c, v) in self.row_iter(r) {
                acc += v * x[c];
            }
            y[r] = acc;
        }
        y
    }

    /// `y = self^T * x` without forming the transpose.
    pub fn transpose_mat_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.nrows);
        let mut y = vec![0.0; self.ncols];
        for r in 0..self.nrows {
            let xr = x[r];
            if xr == 0.0 {
                continue;
            }
            for (c, v) in self.row_iter(r) {
                y[c] += v * xr;
            }
        }
        y
    }

    /// Sparse matrix product `self * other`.
    pub fn mat_mul(&self, other: &CsrMatrix) -> CsrMatrix {
        debug_assert_eq!(self.ncols, other.nrows);
        let mut triplets = Vec::new();
        let mut acc = vec![0.0f64; other.ncols];
        let mut touched = Vec::new();
        for r in 0..self.nrows {
            for (k, v) in self.row_iter(r) {
                for (c, w) in other.row_iter(k) {
                    if acc[c] == 0.0 {
                        touched.push(c);
                    }
                    acc[c] += v * w;
                }
            }
            for &c in &touched {
                if acc[c] != 0.0 {
                    triplets.push((r, c, acc[c]));
                }
                acc[c] = 0.0;
            }
            touched.clear();
        }
        CsrMatrix::from_triplets(self.nrows, other.ncols, &triplets)
    }

    /// Element-wise sum `self + other`.
    pub fn add(&self, other: &CsrMatrix) -> CsrMatrix {
        debug_assert_eq!((self.nrows, self.ncols), (other.nrows, other.ncols));
        let mut triplets: Vec<_> = self.triplet_iter().collect();
        triplets.extend(other.triplet_iter());
        CsrMatrix::from_triplets(self.nrows, self.ncols, &triplets)
    }

    /// Scale every entry by `factor`.
    pub fn scale(&self, factor: f64) -> CsrMatrix {
        if factor == 0.0 {
            return CsrMatrix::zeros(self.nrows, self.ncols);
        }
        let mut out = self.clone();
        for v in &mut out.data {
            *v *= factor;
        }
        out
    }

    /// Entry-wise absolute value.
    pub fn abs(&self) -> CsrMatrix {
        let mut out = self.clone();
        for v in &mut out.data {
            *v = v.abs();
        }
        out
    }

    /// Transpose.
    pub fn transpose(&self) -> CsrMatrix {
        let triplets: Vec<_> = self.triplet_iter().map(|(r, c, v)| (c, r, v)).collect();
        CsrMatrix::from_triplets(self.ncols, self.nrows, &triplets)
    }

    /// Extract the sub-block `self[rows, cols]`.
    pub fn block(&self, rows: Range<usize>, cols: Range<usize>) -> CsrMatrix {
        debug_assert!(rows.end <= self.nrows && cols.end <= self.ncols);
        let mut triplets = Vec::new();
        for (out_r, r) in rows.clone().enumerate() {
            for (c, v) in self.row_iter(r) {
                if cols.contains(&c) {
                    triplets.push((out_r, c - cols.start, v));
                }
            }
        }
        CsrMatrix::from_triplets(rows.len(), cols.len(), &triplets)
    }

    /// True iff `self[rows, cols]` holds no nonzero entry. Cheaper than
    /// [`CsrMatrix::block`]: no sub-matrix is built.
    pub fn block_is_zero(&self, rows: Range<usize>, cols: Range<usize>) -> bool {
        for r in rows {
            for (c, v) in self.row_iter(r) {
                if cols.contains(&c) && v != 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Infinity norm (maximum absolute row sum).
    pub fn norm_inf(&self) -> f64 {
        (0..self.nrows)
            .map(|r| self.row_iter(r).map(|(_, v)| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.nrows, self.ncols));
        for (r, c, v) in self.triplet_iter() {
            out[(r, c)] = v;
        }
        out
    }

    fn drop_zeros(&mut self) {
        if self.data.iter().all(|&v| v != 0.0) {
            return;
        }
        let triplets: Vec<_> = self.triplet_iter().filter(|&(_, _, v)| v != 0.0).collect();
        *self = CsrMatrix::from_triplets(self.nrows, self.ncols, &triplets);
    }
}
