//! Nondeterministic input sequences.
//!
//! A set-valued input is either constant over time or a finite sequence of
//! sets, one per discrete step. Both variants share one iteration contract
//! (`start`/`next_state`/`done`/`len`); dispatch is by variant, not by
//! trait object.

use std::rc::Rc;

use flowpipe_mat::Matrix;
use flowpipe_sets::{linear_map, LazySet, SetRc};

use crate::error::EngineError;

/// Iteration position over an input sequence.
///
/// Surfaces the current input set and the 1-based index of the state; the
/// fields are read-only to callers of the engine.
#[derive(Debug, Clone)]
pub struct InputState {
    pub set: SetRc,
    pub index: usize,
}

/// A set-valued input signal.
#[derive(Debug, Clone)]
pub enum NonDeterministicInput {
    /// The same set at every step; semantically an infinite sequence.
    Constant(SetRc),
    /// One set per step, in order; terminates after the last.
    Varying(Vec<SetRc>),
}

impl NonDeterministicInput {
    /// Constant input over `set`.
    pub fn constant(set: SetRc) -> Self {
        NonDeterministicInput::Constant(set)
    }

    /// Time-varying input; every set must share one ambient dimension.
    pub fn varying(sets: Vec<SetRc>) -> Result<Self, EngineError> {
        let mut dims = sets.iter().map(|s| s.dim());
        if let Some(first) = dims.next() {
            if let Some(bad) = dims.find(|&d| d != first) {
                return Err(EngineError::DimensionMismatch(format!(
                    "varying input mixes dimensions {first} and {bad}"
                )));
            }
        }
        Ok(NonDeterministicInput::Varying(sets))
    }

    /// Ambient dimension of the input sets.
    pub fn dim(&self) -> usize {
        match self {
            NonDeterministicInput::Constant(u) => u.dim(),
            NonDeterministicInput::Varying(us) => us.first().map_or(0, |u| u.dim()),
        }
    }

    /// Number of stored sets: 1 for a constant input by convention, the
    /// sequence length otherwise.
    pub fn len(&self) -> usize {
        match self {
            NonDeterministicInput::Constant(_) => 1,
            NonDeterministicInput::Varying(us) => us.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First iteration state.
    pub fn start(&self) -> InputState {
        match self {
            NonDeterministicInput::Constant(u) => InputState {
                set: u.clone(),
                index: 1,
            },
            NonDeterministicInput::Varying(us) => InputState {
                set: us
                    .first()
                    .cloned()
                    .unwrap_or_else(|| flowpipe_sets::concrete::void(0)),
                index: 1,
            },
        }
    }

    /// Successor of `state`, or `None` when the sequence is exhausted. A
    /// constant input never exhausts and its index stays pinned at 1.
    pub fn next_state(&self, state: &InputState) -> Option<InputState> {
        match self {
            NonDeterministicInput::Constant(u) => Some(InputState {
                set: u.clone(),
                index: 1,
            }),
            NonDeterministicInput::Varying(us) => {
                let next = state.index + 1;
                us.get(next - 1).map(|u| InputState {
                    set: u.clone(),
                    index: next,
                })
            }
        }
    }

    /// True once iteration has moved past the last stored set.
    pub fn done(&self, state: &InputState) -> bool {
        match self {
            NonDeterministicInput::Constant(_) => false,
            NonDeterministicInput::Varying(us) => state.index > us.len(),
        }
    }

    /// `M · U`, applied to every stored set:
    /// `M · Constant(U) = Constant(M · U)`.
    pub fn apply_map(&self, matrix: &Rc<Matrix>) -> Self {
        match self {
            NonDeterministicInput::Constant(u) => {
                NonDeterministicInput::Constant(linear_map(matrix.clone(), u.clone()))
            }
            NonDeterministicInput::Varying(us) => NonDeterministicInput::Varying(
                us.iter()
                    .map(|u| linear_map(matrix.clone(), u.clone()))
                    .collect(),
            ),
        }
    }

    /// Iterate the stored sets in order.
    pub fn iter_sets(&self) -> impl Iterator<Item = &SetRc> {
        match self {
            NonDeterministicInput::Constant(u) => std::slice::from_ref(u).iter(),
            NonDeterministicInput::Varying(us) => us.iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpipe_sets::concrete::{ball2, void};
    use ndarray::arr2;

    #[test]
    fn constant_input_never_terminates() {
        let u = NonDeterministicInput::constant(ball2(vec![0.0, 0.0], 1.0));
        let mut state = u.start();
        for _ in 0..5 {
            assert_eq!(state.index, 1);
            assert!(!u.done(&state));
            state = u.next_state(&state).expect("constant input is infinite");
        }
        assert_eq!(u.len(), 1);
    }

    #[test]
    fn varying_input_steps_through_and_terminates() {
        let sets: Vec<_> = (1..=3).map(|i| ball2(vec![i as f64], 0.1)).collect();
        let u = NonDeterministicInput::varying(sets).unwrap();
        assert_eq!(u.len(), 3);

        let mut state = u.start();
        assert_eq!(state.index, 1);
        for k in 2..=3 {
            state = u.next_state(&state).unwrap();
            assert_eq!(state.index, k);
            assert!(!u.done(&state));
        }
        assert!(u.next_state(&state).is_none());
    }

    #[test]
    fn varying_input_rejects_mixed_dimensions() {
        let err = NonDeterministicInput::varying(vec![void(2), void(3)]);
        assert!(matches!(err, Err(EngineError::DimensionMismatch(_))));
    }

    #[test]
    fn mapping_constant_input_maps_the_set() {
        let u = NonDeterministicInput::constant(ball2(vec![1.0, 0.0], 0.5));
        let m = Rc::new(Matrix::Dense(arr2(&[[2.0, 0.0], [0.0, 2.0]])));
        let mapped = u.apply_map(&m);
        let rho = mapped.start().set.support(&[1.0, 0.0]);
        // 2 * (1 + 0.5)
        assert!((rho - 3.0).abs() < 1e-12);
        assert_eq!(mapped.len(), 1);
    }
}
