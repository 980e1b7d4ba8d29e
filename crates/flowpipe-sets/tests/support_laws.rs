//! Property tests for the support-function algebra.

use std::rc::Rc;

use flowpipe_mat::Matrix;
use flowpipe_sets::concrete::{ball2, ball_inf};
use flowpipe_sets::{
    convex_hull, linear_map, minkowski_sum, norm_inf, scale, symmetric_interval_hull, LazySet,
    SetRc,
};
use ndarray::Array2;
use proptest::prelude::*;

fn arb_direction(dim: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-10.0f64..10.0, dim..=dim)
}

fn arb_ball(dim: usize) -> impl Strategy<Value = SetRc> {
    (
        proptest::collection::vec(-5.0f64..5.0, dim..=dim),
        0.0f64..3.0,
        proptest::bool::ANY,
    )
        .prop_map(|(center, radius, euclidean)| {
            if euclidean {
                ball2(center, radius)
            } else {
                ball_inf(center, radius)
            }
        })
}

fn arb_matrix(dim: usize) -> impl Strategy<Value = Matrix> {
    proptest::collection::vec(-3.0f64..3.0, dim * dim..=dim * dim).prop_map(move |data| {
        Matrix::Dense(Array2::from_shape_vec((dim, dim), data).expect("shape fixed by strategy"))
    })
}

proptest! {
    /// rho_{A ⊕ B} = rho_A + rho_B.
    #[test]
    fn minkowski_sum_adds_supports(a in arb_ball(3), b in arb_ball(3), d in arb_direction(3)) {
        let sum = minkowski_sum(a.clone(), b.clone());
        let lhs = sum.support(&d);
        let rhs = a.support(&d) + b.support(&d);
        prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + rhs.abs()));
    }

    /// rho_{CH(A,B)} = max(rho_A, rho_B).
    #[test]
    fn convex_hull_takes_max(a in arb_ball(3), b in arb_ball(3), d in arb_direction(3)) {
        let hull = convex_hull(a.clone(), b.clone());
        let lhs = hull.support(&d);
        let rhs = a.support(&d).max(b.support(&d));
        prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + rhs.abs()));
    }

    /// rho_{M S}(d) = rho_S(M^T d).
    #[test]
    fn linear_map_defers_to_transpose(m in arb_matrix(3), s in arb_ball(3), d in arb_direction(3)) {
        let mapped = linear_map(Rc::new(m.clone()), s.clone());
        let lhs = mapped.support(&d);
        let md = m.transpose_apply(&d);
        let rhs = s.support(&md);
        prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + rhs.abs()));
    }

    /// Scaling a set scales its support linearly for nonnegative factors.
    #[test]
    fn scale_is_homogeneous(s in arb_ball(2), d in arb_direction(2), c in 0.0f64..4.0) {
        let scaled = scale(c, s.clone());
        let lhs = scaled.support(&d);
        let rhs = c * s.support(&d);
        prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + rhs.abs()));
    }

    /// The symmetric interval hull contains the set: rho_hull >= rho_set in
    /// every direction.
    #[test]
    fn hull_over_approximates(s in arb_ball(3), d in arb_direction(3)) {
        let hull = symmetric_interval_hull(s.clone());
        prop_assert!(hull.support(&d) >= s.support(&d) - 1e-9);
    }

    /// The infinity norm of the hull equals the infinity norm of the set.
    #[test]
    fn hull_preserves_norm_inf(s in arb_ball(3)) {
        let hull = symmetric_interval_hull(s.clone());
        let a = norm_inf(s.as_ref());
        let b = norm_inf(hull.as_ref());
        prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()));
    }
}
