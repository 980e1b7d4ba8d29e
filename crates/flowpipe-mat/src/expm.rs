//! Matrix exponentials.
//!
//! Three routines, matched to the three ways the engine consumes `exp(A)`:
//! a dense scaling-and-squaring `expm` (Padé order 13), a sparse `padm`
//! that evaluates the Padé polynomials in sparse arithmetic, and `expmv`,
//! the action of the exponential on a single vector, which backs the lazy
//! exponential's row and column queries.

use ndarray::Array2;

use crate::dense::{lu_solve, norm_inf_dense};
use crate::sparse::CsrMatrix;
use crate::MatError;

/// Padé-13 numerator coefficients (Higham 2005).
const PADE13: [f64; 14] = [
    64764752532480000.0,
    32382376266240000.0,
    7771770303897600.0,
    1187353796428800.0,
    129060195264000.0,
    10559470521600.0,
    670442572800.0,
    33522128640.0,
    1323241920.0,
    40840800.0,
    960960.0,
    16380.0,
    182.0,
    1.0,
];

/// Scaling threshold for the order-13 approximant.
const THETA13: f64 = 5.371920351148152;

/// Dense matrix exponential by Padé order 13 with scaling and squaring.
pub fn expm(a: &Array2<f64>) -> Result<Array2<f64>, MatError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MatError::DimensionMismatch(format!(
            "expm needs a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }

    let norm = norm_inf_dense(a);
    let squarings = if norm > THETA13 {
        (norm / THETA13).log2().ceil() as u32
    } else {
        0
    };
    let a = a.mapv(|x| x / f64::powi(2.0, squarings as i32));

    let eye: Array2<f64> = Array2::eye(n);
    let a2 = a.dot(&a);
    let a4 = a2.dot(&a2);
    let a6 = a2.dot(&a4);
    let b = &PADE13;

    let u_inner = a6.mapv(|x| x * b[13]) + &a4.mapv(|x| x * b[11]) + &a2.mapv(|x| x * b[9]);
    let u = a.dot(
        &(a6.dot(&u_inner)
            + &a6.mapv(|x| x * b[7])
            + &a4.mapv(|x| x * b[5])
            + &a2.mapv(|x| x * b[3])
            + &eye.mapv(|x| x * b[1])),
    );
    let v_inner = a6.mapv(|x| x * b[12]) + &a4.mapv(|x| x * b[10]) + &a2.mapv(|x| x * b[8]);
    let v = a6.dot(&v_inner)
        + &a6.mapv(|x| x * b[6])
        + &a4.mapv(|x| x * b[4])
        + &a2.mapv(|x| x * b[2])
        + &eye.mapv(|x| x * b[0]);

    // r = (V - U)^-1 (V + U)
    let mut r = lu_solve(&(&v - &u), &(&v + &u))?;
    for _ in 0..squarings {
        r = r.dot(&r);
    }
    Ok(r)
}

/// Sparse matrix exponential by a diagonal Padé approximant of the given
/// degree with scaling and squaring.
///
/// The polynomial part runs in sparse arithmetic, so for a sparse generator
/// the intermediate powers stay sparse; the single denominator solve goes
/// through a dense factorization, and exact zeros of the result are dropped
/// on the way back to CSR.
pub fn padm(a: &CsrMatrix, degree: usize) -> Result<CsrMatrix, MatError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MatError::DimensionMismatch(format!(
            "padm needs a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    let degree = degree.max(1);

    let norm = a.norm_inf();
    let squarings = if norm > 0.5 {
        (norm / 0.5).log2().ceil() as u32
    } else {
        0
    };
    let scaled = a.scale(1.0 / f64::powi(2.0, squarings as i32));

    // Diagonal Padé coefficients: c_0 = 1, c_{k+1} = c_k (p-k) / ((k+1)(2p-k)).
    let mut coeff = vec![1.0f64; degree + 1];
    for k in 0..degree {
        coeff[k + 1] = coeff[k] * (degree - k) as f64 / ((k + 1) * (2 * degree - k)) as f64;
    }

    let mut numerator = CsrMatrix::identity(n);
    let mut denominator = CsrMatrix::identity(n);
    let mut power = CsrMatrix::identity(n);
    let mut sign = 1.0;
    for c in coeff.iter().skip(1) {
        power = power.mat_mul(&scaled);
        sign = -sign;
        numerator = numerator.add(&power.scale(*c));
        denominator = denominator.add(&power.scale(*c * sign));
    }

    let solved = lu_solve(&denominator.to_dense(), &numerator.to_dense())?;
    let mut result = CsrMatrix::from_dense(&solved);
    for _ in 0..squarings {
        result = result.mat_mul(&result);
    }
    Ok(result)
}

/// Convergence tolerance for the truncated Taylor iteration in [`expmv`].
const EXPMV_TOL: f64 = 1e-14;
const EXPMV_MAX_TERMS: usize = 60;

/// Action of the exponential: `exp(t A) v` without forming `exp(t A)`.
///
/// Scaled truncated Taylor: the interval is split into enough sub-steps that
/// `‖τ A‖ ≤ 1`, and within each sub-step terms are accumulated until they
/// stop moving the result.
pub fn expmv(t: f64, a: &CsrMatrix, v: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.nrows(), a.ncols());
    debug_assert_eq!(v.len(), a.ncols());

    let scale = a.norm_inf() * t.abs();
    let steps = scale.ceil().max(1.0) as usize;
    let tau = t / steps as f64;

    let mut w = v.to_vec();
    for _ in 0..steps {
        let mut term = w.clone();
        let mut acc = w.clone();
        for k in 1..=EXPMV_MAX_TERMS {
            term = a.mat_vec(&term);
            let factor = tau / k as f64;
            for x in &mut term {
                *x *= factor;
            }
            for (s, x) in acc.iter_mut().zip(&term) {
                *s += x;
            }
            let term_norm = term.iter().map(|x| x * x).sum::<f64>().sqrt();
            let acc_norm = acc.iter().map(|x| x * x).sum::<f64>().sqrt();
            if term_norm <= EXPMV_TOL * acc_norm.max(1.0) {
                break;
            }
        }
        w = acc;
    }
    w
}
