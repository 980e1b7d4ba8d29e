//! Lazy combinators.
//!
//! Each node owns `Rc` handles to its operands and answers support queries
//! by delegation; nothing is materialized. Constructors apply the algebraic
//! identities of the neutral element: mapping [`VoidSet`] yields a void of
//! the output dimension, and summing with it returns the other operand.

use std::any::Any;
use std::rc::Rc;

use flowpipe_mat::{LazyMatrixExp, Matrix};

use crate::concrete::void;
use crate::{LazySet, SetRc};

/// The matrix operand of a [`LinearMap`]: concrete, or a lazy exponential
/// whose transpose action is computed per query.
#[derive(Debug, Clone)]
pub enum MapRep {
    Concrete(Rc<Matrix>),
    LazyExp(Rc<LazyMatrixExp>),
}

impl MapRep {
    pub fn out_dim(&self) -> usize {
        match self {
            MapRep::Concrete(m) => m.nrows(),
            MapRep::LazyExp(e) => e.dim(),
        }
    }

    pub fn in_dim(&self) -> usize {
        match self {
            MapRep::Concrete(m) => m.ncols(),
            MapRep::LazyExp(e) => e.dim(),
        }
    }

    fn transpose_apply(&self, direction: &[f64]) -> Vec<f64> {
        match self {
            MapRep::Concrete(m) => m.transpose_apply(direction),
            MapRep::LazyExp(e) => e.transpose_apply(direction),
        }
    }
}

/// `M · S`, evaluated as `rho_S(M^T d)`.
#[derive(Debug)]
pub struct LinearMap {
    pub rep: MapRep,
    pub inner: SetRc,
}

impl LazySet for LinearMap {
    fn dim(&self) -> usize {
        self.rep.out_dim()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.rep.out_dim());
        let mapped = self.rep.transpose_apply(direction);
        self.inner.support(&mapped)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `c · S`, evaluated as `rho_S(c d)`.
#[derive(Debug)]
pub struct Scale {
    pub factor: f64,
    pub inner: SetRc,
}

impl LazySet for Scale {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        let scaled: Vec<f64> = direction.iter().map(|d| d * self.factor).collect();
        self.inner.support(&scaled)
    }

    fn is_zero(&self) -> bool {
        self.factor == 0.0 || self.inner.is_zero()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Binary Minkowski sum; support functions add.
#[derive(Debug)]
pub struct MinkowskiSum {
    pub left: SetRc,
    pub right: SetRc,
}

impl LazySet for MinkowskiSum {
    fn dim(&self) -> usize {
        self.left.dim()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        self.left.support(direction) + self.right.support(direction)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// N-ary Minkowski sum with pre-sizable storage.
///
/// The reachability loop accumulates one term per partition block into one
/// of these; void summands are dropped on push.
#[derive(Debug, Default)]
pub struct MinkowskiSumArray {
    pub summands: Vec<SetRc>,
}

impl MinkowskiSumArray {
    pub fn new(summands: Vec<SetRc>) -> Self {
        let summands = summands.into_iter().filter(|s| !s.is_void()).collect();
        Self { summands }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            summands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, set: SetRc) {
        if !set.is_void() {
            debug_assert!(self.summands.iter().all(|s| s.dim() == set.dim()));
            self.summands.push(set);
        }
    }

    pub fn len(&self) -> usize {
        self.summands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summands.is_empty()
    }
}

impl LazySet for MinkowskiSumArray {
    fn dim(&self) -> usize {
        self.summands.first().map_or(0, |s| s.dim())
    }

    fn support(&self, direction: &[f64]) -> f64 {
        self.summands.iter().map(|s| s.support(direction)).sum()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convex hull of two sets; support functions take the max.
#[derive(Debug)]
pub struct ConvexHull {
    pub left: SetRc,
    pub right: SetRc,
}

impl LazySet for ConvexHull {
    fn dim(&self) -> usize {
        self.left.dim()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        self.left
            .support(direction)
            .max(self.right.support(direction))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Cartesian product of blocks; the property predicate of the reachability
/// loop is evaluated against one of these per step.
#[derive(Debug)]
pub struct CartesianProductArray {
    pub components: Vec<SetRc>,
}

impl CartesianProductArray {
    pub fn new(components: Vec<SetRc>) -> Self {
        Self { components }
    }

    pub fn component(&self, i: usize) -> &SetRc {
        &self.components[i]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl LazySet for CartesianProductArray {
    fn dim(&self) -> usize {
        self.components.iter().map(|s| s.dim()).sum()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.dim());
        let mut offset = 0;
        let mut total = 0.0;
        for s in &self.components {
            let d = s.dim();
            total += s.support(&direction[offset..offset + d]);
            offset += d;
        }
        total
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `M · S` behind a shared handle. Mapping the neutral element yields the
/// neutral element of the output dimension.
pub fn linear_map(matrix: Rc<Matrix>, set: SetRc) -> SetRc {
    debug_assert_eq!(matrix.ncols(), set.dim());
    if set.is_void() {
        return void(matrix.nrows());
    }
    Rc::new(LinearMap {
        rep: MapRep::Concrete(matrix),
        inner: set,
    })
}

/// `exp(M) · S` through a lazy exponential, without materializing `exp(M)`.
pub fn linear_map_exp(exp: Rc<LazyMatrixExp>, set: SetRc) -> SetRc {
    debug_assert_eq!(exp.dim(), set.dim());
    if set.is_void() {
        return void(exp.dim());
    }
    Rc::new(LinearMap {
        rep: MapRep::LazyExp(exp),
        inner: set,
    })
}

/// `factor · S` behind a shared handle.
pub fn scale(factor: f64, set: SetRc) -> SetRc {
    if set.is_void() {
        return set;
    }
    Rc::new(Scale { factor, inner: set })
}

/// `A ⊕ B` behind a shared handle; void operands collapse away.
pub fn minkowski_sum(left: SetRc, right: SetRc) -> SetRc {
    if left.is_void() {
        return right;
    }
    if right.is_void() {
        return left;
    }
    debug_assert_eq!(left.dim(), right.dim());
    Rc::new(MinkowskiSum { left, right })
}

/// `CH(A, B)` behind a shared handle; void operands collapse away.
pub fn convex_hull(left: SetRc, right: SetRc) -> SetRc {
    if left.is_void() {
        return right;
    }
    if right.is_void() {
        return left;
    }
    debug_assert_eq!(left.dim(), right.dim());
    Rc::new(ConvexHull { left, right })
}
