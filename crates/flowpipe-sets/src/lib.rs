#![doc = include_str!("../README.md")]

//! Set algebra: the `LazySet` trait, concrete set types, lazy combinators,
//! and the symmetric interval hull.
//!
//! Evaluation is driven entirely by support-function queries:
//! `rho_S(d) = sup { <d, x> : x in S }`. Each combinator answers its query
//! by delegating to its operands, so a reachability step that builds
//! `block(Phi)*X + W` costs nothing until a property predicate asks for a
//! support value.

pub mod concrete;
pub mod hull;
pub mod lazy;

pub use concrete::{Ball2, BallInf, Hyperrectangle, VoidSet, ZeroSet};
pub use hull::{symmetric_interval_hull, symmetric_interval_hull_concrete, SymmetricIntervalHull};
pub use lazy::{
    convex_hull, linear_map, linear_map_exp, minkowski_sum, scale, CartesianProductArray,
    ConvexHull, LinearMap, MapRep, MinkowskiSum, MinkowskiSumArray, Scale,
};

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A convex set evaluated through its support function.
///
/// Implementations are immutable values; combinators hold their operands
/// behind `Rc`, so sub-expressions (an input set reused across reachability
/// steps, say) are shared rather than copied.
pub trait LazySet: fmt::Debug {
    /// Ambient dimension.
    fn dim(&self) -> usize;

    /// Support function `rho(d) = sup { <d, x> : x in S }`.
    ///
    /// `direction` must have length [`dim`](LazySet::dim); this is checked
    /// in debug builds only.
    fn support(&self, direction: &[f64]) -> f64;

    /// True for the neutral element [`VoidSet`]: absorbed by Minkowski sums
    /// and annihilated by linear maps.
    fn is_void(&self) -> bool {
        false
    }

    /// True for sets known to be exactly the origin.
    fn is_zero(&self) -> bool {
        false
    }

    /// Downcasting hook for structural inspection.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a lazy set.
pub type SetRc = Rc<dyn LazySet>;

/// Radius of `S` along coordinate `i`: `max(|rho(e_i)|, |rho(-e_i)|)`.
pub fn coordinate_radius(set: &dyn LazySet, i: usize) -> f64 {
    let n = set.dim();
    debug_assert!(i < n);
    let mut dir = vec![0.0; n];
    dir[i] = 1.0;
    let up = set.support(&dir);
    dir[i] = -1.0;
    let down = set.support(&dir);
    up.abs().max(down.abs())
}

/// Infinity norm of a set: the largest coordinate radius.
pub fn norm_inf(set: &dyn LazySet) -> f64 {
    (0..set.dim())
        .map(|i| coordinate_radius(set, i))
        .fold(0.0, f64::max)
}
