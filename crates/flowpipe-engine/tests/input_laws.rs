//! Property tests for the input-sequence iteration contract.

use std::rc::Rc;

use flowpipe_engine::NonDeterministicInput;
use flowpipe_mat::{CsrMatrix, Matrix};
use flowpipe_sets::concrete::{ball2, ball_inf};
use flowpipe_sets::{LazySet, SetRc};
use proptest::prelude::*;

fn arb_sets(dim: usize) -> impl Strategy<Value = Vec<SetRc>> {
    proptest::collection::vec(
        (
            proptest::collection::vec(-2.0f64..2.0, dim..=dim),
            0.0f64..1.0,
        )
            .prop_map(|(center, radius)| ball_inf(center, radius)),
        1..8,
    )
}

proptest! {
    /// A constant input yields the same set forever and its index stays 1.
    #[test]
    fn constant_input_is_a_fixed_point(
        center in proptest::collection::vec(-2.0f64..2.0, 3),
        radius in 0.0f64..1.0,
        steps in 1usize..20,
    ) {
        let set = ball2(center, radius);
        let expected = set.support(&[1.0, 0.0, 0.0]);
        let u = NonDeterministicInput::constant(set);
        let mut state = u.start();
        for _ in 0..steps {
            prop_assert_eq!(state.index, 1);
            prop_assert!(!u.done(&state));
            prop_assert!((state.set.support(&[1.0, 0.0, 0.0]) - expected).abs() < 1e-12);
            state = u.next_state(&state).expect("constant input never ends");
        }
        prop_assert_eq!(u.len(), 1);
    }

    /// A varying input visits its sets in order, counting from 1, and
    /// terminates exactly after the last one.
    #[test]
    fn varying_input_visits_every_set_once(sets in arb_sets(2)) {
        let supports: Vec<f64> = sets.iter().map(|s| s.support(&[1.0, 0.0])).collect();
        let m = sets.len();
        let u = NonDeterministicInput::varying(sets).expect("uniform dimensions");
        prop_assert_eq!(u.len(), m);

        let mut state = u.start();
        for (i, expected) in supports.iter().enumerate() {
            prop_assert_eq!(state.index, i + 1);
            prop_assert!((state.set.support(&[1.0, 0.0]) - expected).abs() < 1e-12);
            match u.next_state(&state) {
                Some(next) => {
                    prop_assert!(i + 1 < m);
                    state = next;
                }
                None => prop_assert_eq!(i + 1, m),
            }
        }
    }

    /// Mapping a constant input commutes with mapping its set.
    #[test]
    fn matrix_map_commutes_with_constant_input(
        center in proptest::collection::vec(-2.0f64..2.0, 2),
        radius in 0.0f64..1.0,
        entries in proptest::collection::vec(-2.0f64..2.0, 4),
    ) {
        let m = Rc::new(Matrix::Sparse(CsrMatrix::from_triplets(
            2,
            2,
            &[
                (0, 0, entries[0]),
                (0, 1, entries[1]),
                (1, 0, entries[2]),
                (1, 1, entries[3]),
            ],
        )));
        let u = NonDeterministicInput::constant(ball2(center.clone(), radius));
        let mapped = u.apply_map(&m);
        let direct = flowpipe_sets::linear_map(m, ball2(center, radius));
        for dir in [[1.0, 0.0], [0.0, 1.0], [1.0, -1.0]] {
            let a = mapped.start().set.support(&dir);
            let b = direct.support(&dir);
            prop_assert!((a - b).abs() < 1e-10);
        }
    }
}
