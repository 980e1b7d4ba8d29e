//! System descriptors.
//!
//! Immutable records tying together the dynamics matrix, the initial set,
//! and the input signal, plus the initial-value-problem wrapper the public
//! API operates on. Constructors validate shapes once; everything after
//! that assumes consistency.

use flowpipe_mat::Matrix;
use flowpipe_sets::concrete::void;
use flowpipe_sets::{LazySet, SetRc};

use crate::error::EngineError;
use crate::expmat::MatrixExp;
use crate::inputs::NonDeterministicInput;

/// `x'(t) = A x(t) + u(t)`, `x(0) ∈ X₀`, `u(t) ∈ 𝒰(t)`.
#[derive(Debug, Clone)]
pub struct ContinuousSystem {
    pub a: Matrix,
    pub x0: SetRc,
    pub u: NonDeterministicInput,
}

impl ContinuousSystem {
    /// Homogeneous system: the input defaults to the neutral element.
    pub fn new(a: Matrix, x0: SetRc) -> Result<Self, EngineError> {
        let n = a.nrows();
        Self::with_inputs(a, x0, NonDeterministicInput::constant(void(n)))
    }

    /// System with a constant input set.
    pub fn with_input(a: Matrix, x0: SetRc, u: SetRc) -> Result<Self, EngineError> {
        Self::with_inputs(a, x0, NonDeterministicInput::constant(u))
    }

    /// System with a time-varying input sequence.
    pub fn with_varying_input(a: Matrix, x0: SetRc, us: Vec<SetRc>) -> Result<Self, EngineError> {
        let u = NonDeterministicInput::varying(us)?;
        Self::with_inputs(a, x0, u)
    }

    /// System with an already-built input signal.
    pub fn with_inputs(
        a: Matrix,
        x0: SetRc,
        u: NonDeterministicInput,
    ) -> Result<Self, EngineError> {
        if !a.is_square() {
            return Err(EngineError::DimensionMismatch(format!(
                "system matrix must be square, got {}x{}",
                a.nrows(),
                a.ncols()
            )));
        }
        let n = a.nrows();
        if x0.dim() != n {
            return Err(EngineError::DimensionMismatch(format!(
                "initial set has dimension {}, system has {n}",
                x0.dim()
            )));
        }
        if u.dim() != n {
            return Err(EngineError::DimensionMismatch(format!(
                "input has dimension {}, system has {n}",
                u.dim()
            )));
        }
        Ok(Self { a, x0, u })
    }

    /// State-space dimension.
    pub fn dim(&self) -> usize {
        self.a.nrows()
    }
}

/// `x_{k+1} = Φ x_k + v_k`, `x_0 ∈ X₀`, `v_k ∈ 𝒱(k)`, with step `δ`.
///
/// `Φ` may be a lazy exponential that is never materialized.
#[derive(Debug, Clone)]
pub struct DiscreteSystem {
    pub phi: MatrixExp,
    pub x0: SetRc,
    pub u: NonDeterministicInput,
    pub delta: f64,
}

impl DiscreteSystem {
    pub fn new(phi: MatrixExp, x0: SetRc, delta: f64) -> Result<Self, EngineError> {
        let n = phi.dim();
        Self::with_inputs(phi, x0, NonDeterministicInput::constant(void(n)), delta)
    }

    pub fn with_input(
        phi: MatrixExp,
        x0: SetRc,
        u: SetRc,
        delta: f64,
    ) -> Result<Self, EngineError> {
        Self::with_inputs(phi, x0, NonDeterministicInput::constant(u), delta)
    }

    pub fn with_inputs(
        phi: MatrixExp,
        x0: SetRc,
        u: NonDeterministicInput,
        delta: f64,
    ) -> Result<Self, EngineError> {
        if delta < 0.0 {
            return Err(EngineError::Domain(format!(
                "time step must be nonnegative, got {delta}"
            )));
        }
        let n = phi.dim();
        if x0.dim() != n {
            return Err(EngineError::DimensionMismatch(format!(
                "initial set has dimension {}, system has {n}",
                x0.dim()
            )));
        }
        if u.dim() != n {
            return Err(EngineError::DimensionMismatch(format!(
                "input has dimension {}, system has {n}",
                u.dim()
            )));
        }
        Ok(Self { phi, x0, u, delta })
    }

    /// State-space dimension.
    pub fn dim(&self) -> usize {
        self.phi.dim()
    }
}

/// A system paired with its role as an initial-value problem.
///
/// Thin wrapper so the discretization API reads
/// `discretize(ivp) -> ivp_discrete`; the payload is the system itself.
#[derive(Debug, Clone)]
pub struct InitialValueProblem<S> {
    pub system: S,
}

impl<S> InitialValueProblem<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }
}

impl InitialValueProblem<ContinuousSystem> {
    pub fn dim(&self) -> usize {
        self.system.dim()
    }
}

impl InitialValueProblem<DiscreteSystem> {
    pub fn dim(&self) -> usize {
        self.system.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpipe_mat::CsrMatrix;
    use flowpipe_sets::concrete::ball_inf;

    fn a2() -> Matrix {
        Matrix::Sparse(CsrMatrix::identity(2))
    }

    #[test]
    fn homogeneous_constructor_installs_void_input() {
        let s = ContinuousSystem::new(a2(), ball_inf(vec![0.0, 0.0], 1.0)).unwrap();
        assert!(s.u.start().set.is_void());
        assert_eq!(s.dim(), 2);
    }

    #[test]
    fn mismatched_initial_set_is_rejected() {
        let err = ContinuousSystem::new(a2(), ball_inf(vec![0.0; 3], 1.0));
        assert!(matches!(err, Err(EngineError::DimensionMismatch(_))));
    }

    #[test]
    fn negative_delta_is_a_domain_error() {
        let phi = MatrixExp::Sparse(CsrMatrix::identity(2));
        let err = DiscreteSystem::new(phi, ball_inf(vec![0.0, 0.0], 1.0), -0.1);
        assert!(matches!(err, Err(EngineError::Domain(_))));
    }

    #[test]
    fn zero_delta_is_allowed() {
        let phi = MatrixExp::Sparse(CsrMatrix::identity(2));
        assert!(DiscreteSystem::new(phi, ball_inf(vec![0.0, 0.0], 1.0), 0.0).is_ok());
    }
}
