//! Discretization of continuous affine systems.
//!
//! Converts `x' = A x + u`, `x(0) ∈ X₀`, `u ∈ 𝒰` into a discrete
//! abstraction `(Φ, Ω₀, 𝒱)` whose trajectories over-approximate every
//! continuous trajectory on `[0, N δ]`. Four approximation models trade
//! conservativeness against cost:
//!
//! - `nobloating`: `Ω₀ = X₀`, inputs mapped through `Φ₁(A, δ)`; sound for
//!   discrete-time semantics only.
//! - `forward` / `backward`: interpolation with symmetric-interval-hull
//!   bloating terms built from `Φ₂(|A|, δ)`; sound for dense time.
//! - `firstorder`: coarse first-order bloating in the infinity norm.
//!
//! `Φ₁` and `Φ₂` are recovered as blocks of the exponential of a `3n×3n`
//! augmented matrix, so no integral is ever evaluated directly.

use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use flowpipe_mat::{CsrMatrix, Matrix};
use flowpipe_sets::concrete::{ball2, void, zero};
use flowpipe_sets::{
    convex_hull, linear_map, minkowski_sum, norm_inf, scale, symmetric_interval_hull,
    symmetric_interval_hull_concrete, LazySet, SetRc,
};

use crate::error::EngineError;
use crate::expmat::{expmat, ExpMode, MatrixExp};
use crate::inputs::NonDeterministicInput;
use crate::system::{ContinuousSystem, DiscreteSystem, InitialValueProblem};

/// Approximation model for the discrete abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproxModel {
    #[default]
    Forward,
    Backward,
    FirstOrder,
    NoBloating,
}

impl ApproxModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApproxModel::Forward => "forward",
            ApproxModel::Backward => "backward",
            ApproxModel::FirstOrder => "firstorder",
            ApproxModel::NoBloating => "nobloating",
        }
    }
}

impl FromStr for ApproxModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(ApproxModel::Forward),
            "backward" => Ok(ApproxModel::Backward),
            "firstorder" => Ok(ApproxModel::FirstOrder),
            "nobloating" => Ok(ApproxModel::NoBloating),
            other => Err(EngineError::InvalidApproxModel(other.to_string())),
        }
    }
}

/// Discretization options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscretizeOptions {
    pub approx_model: ApproxModel,
    /// Use the sparse Padé approximant instead of dense `expm`.
    pub pade_expm: bool,
    /// Keep `Φ` (and the augmented exponentials) lazy.
    pub lazy_expm: bool,
    /// Keep symmetric interval hulls lazy instead of concretizing them.
    pub lazy_sih: bool,
    /// Select parallel hull/extraction routines. No parallel routine is
    /// implemented; `true` is rejected.
    pub parallel: bool,
}

impl Default for DiscretizeOptions {
    fn default() -> Self {
        Self {
            approx_model: ApproxModel::Forward,
            pade_expm: false,
            lazy_expm: false,
            lazy_sih: true,
            parallel: false,
        }
    }
}

impl DiscretizeOptions {
    fn exp_mode(&self) -> ExpMode {
        if self.lazy_expm {
            ExpMode::Lazy
        } else if self.pade_expm {
            ExpMode::Pade
        } else {
            ExpMode::Dense
        }
    }
}

/// Discretize an initial-value problem with time step `delta`.
pub fn discretize(
    ivp: &InitialValueProblem<ContinuousSystem>,
    delta: f64,
    opts: &DiscretizeOptions,
) -> Result<InitialValueProblem<DiscreteSystem>, EngineError> {
    if delta < 0.0 {
        return Err(EngineError::Domain(format!(
            "time step must be nonnegative, got {delta}"
        )));
    }
    if opts.parallel {
        return Err(EngineError::NotImplemented(
            "parallel hull and column-extraction routines",
        ));
    }

    let sys = &ivp.system;
    let n = sys.dim();
    debug!(
        model = opts.approx_model.as_str(),
        delta,
        n,
        lazy = opts.lazy_expm,
        "discretizing"
    );

    let phi = expmat(&sys.a, delta, opts.exp_mode())?;
    let (omega0, v) = match opts.approx_model {
        ApproxModel::NoBloating => discretize_no_bloating(sys, delta, &phi, opts)?,
        ApproxModel::Forward => discretize_interpolation(sys, delta, &phi, opts, Interp::Forward)?,
        ApproxModel::Backward => {
            discretize_interpolation(sys, delta, &phi, opts, Interp::Backward)?
        }
        ApproxModel::FirstOrder => discretize_first_order(sys, delta, &phi)?,
    };

    let system = DiscreteSystem::with_inputs(phi, omega0, v, delta)?;
    Ok(InitialValueProblem::new(system))
}

/// Which interpolation direction the bloating term uses.
#[derive(Clone, Copy)]
enum Interp {
    Forward,
    Backward,
}

/// Augmented generator `[[B, δI, 0], [0, 0, δI], [0, 0, 0]]` of size `3n`.
///
/// The `(1,2)` block of its exponential is `Φ₁(B/δ, δ)` and the `(1,3)`
/// block is `Φ₂(B/δ, δ)`.
fn augmented_generator(b: &Matrix, delta: f64) -> CsrMatrix {
    let n = b.nrows();
    let sparse = b.to_sparse();
    let mut triplets: Vec<(usize, usize, f64)> = sparse.triplet_iter().collect();
    for i in 0..n {
        triplets.push((i, n + i, delta));
        triplets.push((n + i, 2 * n + i, delta));
    }
    CsrMatrix::from_triplets(3 * n, 3 * n, &triplets)
}

/// Block `[0..n, cols]` of `exp(G)` under the requested backend. In lazy
/// mode only the touched columns are materialized.
fn augmented_exp_block(
    g: &CsrMatrix,
    n: usize,
    cols: std::ops::Range<usize>,
    mode: ExpMode,
) -> Result<Matrix, EngineError> {
    let exp = expmat(&Matrix::Sparse(g.clone()), 1.0, mode)?;
    let block = match exp {
        MatrixExp::Lazy(_) => {
            let full = exp.columns(cols);
            full.block(0..n, 0..full.ncols())
        }
        _ => exp.block(0..n, cols),
    };
    Ok(block)
}

/// `Φ₁(A, δ)`: the upper-middle block of the augmented exponential, which
/// maps a constant input to its one-step reachable contribution.
fn phi1(a: &Matrix, delta: f64, mode: ExpMode) -> Result<Matrix, EngineError> {
    let n = a.nrows();
    let g = augmented_generator(&a.scale(delta), delta);
    augmented_exp_block(&g, n, n..2 * n, mode)
}

/// `Φ₂(|A|, δ)`: the upper-right block of the augmented exponential over
/// the entry-wise absolute generator, which scales the bloating hulls.
fn phi2_abs(a: &Matrix, delta: f64, mode: ExpMode) -> Result<Matrix, EngineError> {
    let n = a.nrows();
    let g = augmented_generator(&a.abs().scale(delta), delta);
    augmented_exp_block(&g, n, 2 * n..3 * n, mode)
}

fn discretize_no_bloating(
    sys: &ContinuousSystem,
    delta: f64,
    _phi: &MatrixExp,
    opts: &DiscretizeOptions,
) -> Result<(SetRc, NonDeterministicInput), EngineError> {
    let n = sys.dim();
    let omega0 = sys.x0.clone();

    // Homogeneous shortcut: mapping the neutral element stays neutral, so
    // Φ₁ is never needed.
    if input_is_void(&sys.u) {
        return Ok((omega0, NonDeterministicInput::constant(void(n))));
    }

    let m = Rc::new(phi1(&sys.a, delta, opts.exp_mode())?);
    let v = sys.u.apply_map(&m);
    Ok((omega0, v))
}

fn discretize_interpolation(
    sys: &ContinuousSystem,
    delta: f64,
    phi: &MatrixExp,
    opts: &DiscretizeOptions,
    interp: Interp,
) -> Result<(SetRc, NonDeterministicInput), EngineError> {
    let n = sys.dim();
    let sih = |s: SetRc| -> SetRc {
        if opts.lazy_sih {
            symmetric_interval_hull(s)
        } else {
            Rc::new(symmetric_interval_hull_concrete(s.as_ref()))
        }
    };
    let a = Rc::new(sys.a.clone());
    let phi_x0 = phi.map_set(sys.x0.clone());

    let first_input = sys.u.start().set;
    if first_input.is_void() {
        // Fully homogeneous: bloat the initial set only.
        let p2 = Rc::new(phi2_abs(&sys.a, delta, opts.exp_mode())?);
        let e_omega = sih(linear_map(
            p2,
            sih(initial_bloat_operand(&a, phi, &sys.x0, interp)),
        ));
        let omega0 = convex_hull(sys.x0.clone(), minkowski_sum(phi_x0, e_omega));
        return Ok((omega0, NonDeterministicInput::constant(void(n))));
    }
    if first_input.is_zero() {
        // Zero input: no bloating term survives the hulls.
        let omega0 = convex_hull(
            sys.x0.clone(),
            minkowski_sum(phi_x0, scale(delta, zero(n))),
        );
        return Ok((omega0, NonDeterministicInput::constant(zero(n))));
    }

    let p2 = Rc::new(phi2_abs(&sys.a, delta, opts.exp_mode())?);

    // 𝒱_U = δ·U ⊕ sih(Φ₂|A| · sih(A·U)), per input set.
    let input_term = |u: &SetRc| -> SetRc {
        let e_psi = sih(linear_map(
            p2.clone(),
            sih(linear_map(a.clone(), u.clone())),
        ));
        minkowski_sum(scale(delta, u.clone()), e_psi)
    };

    let v_sets: Vec<SetRc> = sys.u.iter_sets().map(input_term).collect();
    let v = match &sys.u {
        NonDeterministicInput::Constant(_) => {
            NonDeterministicInput::constant(v_sets[0].clone())
        }
        NonDeterministicInput::Varying(_) => NonDeterministicInput::varying(v_sets.clone())?,
    };

    let e_omega = sih(linear_map(
        p2.clone(),
        sih(initial_bloat_operand(&a, phi, &sys.x0, interp)),
    ));
    let omega0 = convex_hull(
        sys.x0.clone(),
        minkowski_sum(minkowski_sum(phi_x0, v_sets[0].clone()), e_omega),
    );
    Ok((omega0, v))
}

/// Operand of the initial-set bloating hull: `A²·X₀` for the forward
/// model, `A²·(Φ·X₀)` for the backward model (associated as nested maps so
/// a lazy `Φ` stays lazy).
fn initial_bloat_operand(
    a: &Rc<Matrix>,
    phi: &MatrixExp,
    x0: &SetRc,
    interp: Interp,
) -> SetRc {
    let a2 = Rc::new(a.mat_mul(a));
    match interp {
        Interp::Forward => linear_map(a2, x0.clone()),
        Interp::Backward => linear_map(a2, phi.map_set(x0.clone())),
    }
}

fn discretize_first_order(
    sys: &ContinuousSystem,
    delta: f64,
    phi: &MatrixExp,
) -> Result<(SetRc, NonDeterministicInput), EngineError> {
    let n = sys.dim();
    let a_norm = sys.a.norm_inf();
    let r_x0 = norm_inf(sys.x0.as_ref());
    let growth = (delta * a_norm).exp() - 1.0 - delta * a_norm;
    let phi_x0 = phi.map_set(sys.x0.clone());

    let first_input = sys.u.start().set;
    if first_input.is_void() {
        let alpha = growth * r_x0;
        let omega0 = convex_hull(
            sys.x0.clone(),
            minkowski_sum(phi_x0, ball2(vec![0.0; n], alpha)),
        );
        return Ok((omega0, NonDeterministicInput::constant(void(n))));
    }

    // growth is O(‖A‖²), so the R_U/‖A‖ term vanishes as ‖A‖ → 0.
    let input_term = |u: &SetRc| -> (SetRc, f64) {
        let r_u = norm_inf(u.as_ref());
        let ratio = if a_norm == 0.0 { 0.0 } else { r_u / a_norm };
        let beta = growth * ratio;
        let set = minkowski_sum(scale(delta, u.clone()), ball2(vec![0.0; n], beta));
        (set, ratio)
    };

    let built: Vec<(SetRc, f64)> = sys.u.iter_sets().map(input_term).collect();
    let v = match &sys.u {
        NonDeterministicInput::Constant(_) => {
            NonDeterministicInput::constant(built[0].0.clone())
        }
        NonDeterministicInput::Varying(_) => {
            NonDeterministicInput::varying(built.iter().map(|(s, _)| s.clone()).collect())?
        }
    };

    let alpha = growth * (r_x0 + built[0].1);
    let omega0 = convex_hull(
        sys.x0.clone(),
        minkowski_sum(
            minkowski_sum(phi_x0, scale(delta, first_input)),
            ball2(vec![0.0; n], alpha),
        ),
    );
    Ok((omega0, v))
}

fn input_is_void(u: &NonDeterministicInput) -> bool {
    matches!(u, NonDeterministicInput::Constant(s) if s.is_void())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_model_parses_known_names() {
        assert_eq!("forward".parse::<ApproxModel>().unwrap(), ApproxModel::Forward);
        assert_eq!(
            "nobloating".parse::<ApproxModel>().unwrap(),
            ApproxModel::NoBloating
        );
        assert!(matches!(
            "euler".parse::<ApproxModel>(),
            Err(EngineError::InvalidApproxModel(_))
        ));
    }

    #[test]
    fn options_default_to_forward_lazy_sih() {
        let opts = DiscretizeOptions::default();
        assert_eq!(opts.approx_model, ApproxModel::Forward);
        assert!(!opts.pade_expm);
        assert!(!opts.lazy_expm);
        assert!(opts.lazy_sih);
        assert!(!opts.parallel);
    }

    #[test]
    fn augmented_generator_layout() {
        let a = Matrix::Sparse(CsrMatrix::from_triplets(2, 2, &[(0, 1, 3.0)]));
        let g = augmented_generator(&a.scale(0.5), 0.5);
        assert_eq!(g.nrows(), 6);
        assert_eq!(g.get(0, 1), 1.5);
        assert_eq!(g.get(0, 2), 0.5);
        assert_eq!(g.get(1, 3), 0.5);
        assert_eq!(g.get(2, 4), 0.5);
        assert_eq!(g.get(3, 5), 0.5);
        assert!(g.block_is_zero(4..6, 0..6));
    }

    #[test]
    fn phi1_of_zero_matrix_is_delta_identity() {
        // For A = 0, Φ₁ = ∫₀^δ exp(0 s) ds = δ I.
        let a = Matrix::Sparse(CsrMatrix::zeros(3, 3));
        let m = phi1(&a, 0.25, ExpMode::Dense).unwrap();
        let d = m.to_dense();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 0.25 } else { 0.0 };
                assert!((d[(i, j)] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn phi2_of_zero_matrix_is_half_delta_squared() {
        // For A = 0, Φ₂ = ∫₀^δ (δ - s) ds = δ²/2 I.
        let a = Matrix::Sparse(CsrMatrix::zeros(2, 2));
        let m = phi2_abs(&a, 0.5, ExpMode::Dense).unwrap();
        let d = m.to_dense();
        assert!((d[(0, 0)] - 0.125).abs() < 1e-12);
        assert!((d[(1, 1)] - 0.125).abs() < 1e-12);
        assert!(d[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn phi1_lazy_matches_dense() {
        let a = Matrix::Sparse(CsrMatrix::from_triplets(
            2,
            2,
            &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, -1.0)],
        ));
        let dense = phi1(&a, 0.1, ExpMode::Dense).unwrap().to_dense();
        let lazy = phi1(&a, 0.1, ExpMode::Lazy).unwrap().to_dense();
        for i in 0..2 {
            for j in 0..2 {
                assert!((dense[(i, j)] - lazy[(i, j)]).abs() < 1e-8);
            }
        }
    }
}
