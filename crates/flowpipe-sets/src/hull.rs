//! Symmetric interval hull.
//!
//! The smallest origin-centred box containing a set. The lazy node computes
//! the radius of each coordinate only when a query touches it, caching the
//! answer; the concrete form materializes all radii into a
//! [`Hyperrectangle`] up front.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::concrete::Hyperrectangle;
use crate::{coordinate_radius, LazySet, SetRc};

/// Lazy symmetric interval hull of a set.
#[derive(Debug)]
pub struct SymmetricIntervalHull {
    pub inner: SetRc,
    /// Per-coordinate radii, filled on first touch.
    radii: RefCell<Vec<Option<f64>>>,
}

impl SymmetricIntervalHull {
    pub fn new(inner: SetRc) -> Self {
        let n = inner.dim();
        Self {
            inner,
            radii: RefCell::new(vec![None; n]),
        }
    }

    /// Radius along coordinate `i`, computed on demand.
    pub fn radius(&self, i: usize) -> f64 {
        let cached = self.radii.borrow()[i];
        match cached {
            Some(r) => r,
            None => {
                let r = coordinate_radius(self.inner.as_ref(), i);
                self.radii.borrow_mut()[i] = Some(r);
                r
            }
        }
    }
}

impl LazySet for SymmetricIntervalHull {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.dim());
        direction
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != 0.0)
            .map(|(i, d)| self.radius(i) * d.abs())
            .sum()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Lazy hull behind a shared handle. Hulling the neutral element is the
/// neutral element.
pub fn symmetric_interval_hull(set: SetRc) -> SetRc {
    if set.is_void() {
        return set;
    }
    Rc::new(SymmetricIntervalHull::new(set))
}

/// Eager hull: all radii are computed immediately.
pub fn symmetric_interval_hull_concrete(set: &dyn LazySet) -> Hyperrectangle {
    let radii: Vec<f64> = (0..set.dim()).map(|i| coordinate_radius(set, i)).collect();
    Hyperrectangle::symmetric(radii)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::{ball2, ball_inf};

    #[test]
    fn hull_of_shifted_ball_covers_far_side() {
        // Ball2 centred at 2 with radius 1 spans [1, 3]; the symmetric hull
        // has radius 3.
        let h = symmetric_interval_hull(ball2(vec![2.0], 1.0));
        assert!((h.support(&[1.0]) - 3.0).abs() < 1e-12);
        assert!((h.support(&[-1.0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn lazy_and_concrete_agree() {
        let s = ball_inf(vec![1.0, -0.5], 0.25);
        let lazy = symmetric_interval_hull(s.clone());
        let eager = symmetric_interval_hull_concrete(s.as_ref());
        for dir in [[1.0, 0.0], [0.0, 1.0], [1.0, -1.0]] {
            assert!((lazy.support(&dir) - eager.support(&dir)).abs() < 1e-12);
        }
    }

    #[test]
    fn radius_is_cached_per_coordinate() {
        let hull = SymmetricIntervalHull::new(ball2(vec![0.0, 4.0], 1.0));
        assert!((hull.radius(1) - 5.0).abs() < 1e-12);
        assert!((hull.radius(1) - 5.0).abs() < 1e-12);
        assert!((hull.radius(0) - 1.0).abs() < 1e-12);
    }
}
