//! Helpers over `ndarray` dense matrices.

use ndarray::linalg::general_mat_mul;
use ndarray::{s, Array2};

use crate::MatError;

/// In-place multiply `out = a * b` into a pre-sized buffer.
///
/// `out` must already have shape `(a.nrows, b.ncols)`; the buffer is reused
/// across calls so the hot loop of the reachability engine never reallocates.
pub fn mat_mul_into(out: &mut Array2<f64>, a: &Array2<f64>, b: &Array2<f64>) {
    debug_assert_eq!(a.ncols(), b.nrows());
    debug_assert_eq!(out.dim(), (a.nrows(), b.ncols()));
    general_mat_mul(1.0, a, b, 0.0, out);
}

/// Infinity norm (maximum absolute row sum).
pub fn norm_inf_dense(a: &Array2<f64>) -> f64 {
    a.rows()
        .into_iter()
        .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Extract the sub-block `a[rows, cols]` as an owned matrix.
pub fn block(a: &Array2<f64>, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Array2<f64> {
    a.slice(s![rows, cols]).to_owned()
}

/// Solve `A X = B` by LU factorization with partial pivoting.
///
/// Used by the Padé approximants, where the denominator polynomial must be
/// inverted. Fails with [`MatError::Singular`] when a pivot falls below a
/// scale-relative threshold.
pub fn lu_solve(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>, MatError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MatError::DimensionMismatch(format!(
            "lu_solve needs a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(MatError::DimensionMismatch(format!(
            "lu_solve rhs has {} rows, expected {n}",
            b.nrows()
        )));
    }

    let mut lu = a.clone();
    let mut x = b.clone();
    let m = b.ncols();
    let tiny = norm_inf_dense(a).max(1.0) * f64::EPSILON * n as f64;

    for col in 0..n {
        // Partial pivot: largest magnitude on or below the diagonal.
        let mut pivot_row = col;
        let mut pivot_val = lu[(col, col)].abs();
        for row in col + 1..n {
            let v = lu[(row, col)].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = row;
            }
        }
        if pivot_val <= tiny {
            return Err(MatError::Singular {
                pivot: pivot_val,
                col,
            });
        }
        if pivot_row != col {
            for j in 0..n {
                lu.swap((col, j), (pivot_row, j));
            }
            for j in 0..m {
                x.swap((col, j), (pivot_row, j));
            }
        }
        let inv = 1.0 / lu[(col, col)];
        for row in col + 1..n {
            let factor = lu[(row, col)] * inv;
            if factor == 0.0 {
                continue;
            }
            lu[(row, col)] = factor;
            for j in col + 1..n {
                let delta = factor * lu[(col, j)];
                lu[(row, j)] -= delta;
            }
            for j in 0..m {
                let delta = factor * x[(col, j)];
                x[(row, j)] -= delta;
            }
        }
    }

    // Back substitution.
    for col in (0..n).rev() {
        let inv = 1.0 / lu[(col, col)];
        for j in 0..m {
            x[(col, j)] *= inv;
        }
        for row in 0..col {
            let factor = lu[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for j in 0..m {
                let delta = factor * x[(col, j)];
                x[(row, j)] -= delta;
            }
        }
    }

    Ok(x)
}
