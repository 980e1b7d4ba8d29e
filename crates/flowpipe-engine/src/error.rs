//! Engine errors.

use thiserror::Error;

/// Errors raised by discretization and reachability checking.
///
/// Safety-property violations are *not* errors: they are the nonzero return
/// value of the checking loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A numeric argument is outside its domain (for example a negative
    /// time step).
    #[error("domain error: {0}")]
    Domain(String),

    /// The approximation-model name is not one of
    /// `forward`/`backward`/`firstorder`/`nobloating`.
    #[error("unknown approximation model `{0}`")]
    InvalidApproxModel(String),

    /// A recognized option selects a code path that does not exist yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Shapes of the system matrix, sets, inputs, or partition disagree.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Bubbled up from the matrix layer (singular Padé denominator, shape
    /// errors inside an exponential).
    #[error(transparent)]
    Matrix(#[from] flowpipe_mat::MatError),
}
