//! Concrete set types.

use std::any::Any;
use std::rc::Rc;

use crate::{LazySet, SetRc};

/// The neutral element of the set algebra in dimension `n`.
///
/// `X ⊕ Void = X` and `M · Void = Void`; it stands in for "no input" in a
/// homogeneous system. Its support is zero by convention, but combinators
/// test [`LazySet::is_void`] and skip it before ever querying.
#[derive(Debug, Clone, PartialEq)]
pub struct VoidSet {
    pub dim: usize,
}

impl VoidSet {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl LazySet for VoidSet {
    fn dim(&self) -> usize {
        self.dim
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.dim);
        0.0
    }

    fn is_void(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The singleton `{0}` in dimension `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroSet {
    pub dim: usize,
}

impl ZeroSet {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl LazySet for ZeroSet {
    fn dim(&self) -> usize {
        self.dim
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.dim);
        0.0
    }

    fn is_zero(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Euclidean ball `{ x : ‖x - center‖₂ ≤ radius }`.
///
/// `rho(d) = <center, d> + radius ‖d‖₂`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball2 {
    pub center: Vec<f64>,
    pub radius: f64,
}

impl Ball2 {
    pub fn new(center: Vec<f64>, radius: f64) -> Self {
        debug_assert!(radius >= 0.0);
        Self { center, radius }
    }
}

impl LazySet for Ball2 {
    fn dim(&self) -> usize {
        self.center.len()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.center.len());
        let norm2 = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
        dot(&self.center, direction) + self.radius * norm2
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Infinity-norm ball `{ x : ‖x - center‖∞ ≤ radius }`.
///
/// `rho(d) = <center, d> + radius ‖d‖₁`.
#[derive(Debug, Clone, PartialEq)]
pub struct BallInf {
    pub center: Vec<f64>,
    pub radius: f64,
}

impl BallInf {
    pub fn new(center: Vec<f64>, radius: f64) -> Self {
        debug_assert!(radius >= 0.0);
        Self { center, radius }
    }
}

impl LazySet for BallInf {
    fn dim(&self) -> usize {
        self.center.len()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.center.len());
        let norm1 = direction.iter().map(|d| d.abs()).sum::<f64>();
        dot(&self.center, direction) + self.radius * norm1
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Axis-aligned box with per-coordinate radii.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperrectangle {
    pub center: Vec<f64>,
    pub radii: Vec<f64>,
}

impl Hyperrectangle {
    pub fn new(center: Vec<f64>, radii: Vec<f64>) -> Self {
        debug_assert_eq!(center.len(), radii.len());
        Self { center, radii }
    }

    /// Origin-centred box.
    pub fn symmetric(radii: Vec<f64>) -> Self {
        let center = vec![0.0; radii.len()];
        Self { center, radii }
    }
}

impl LazySet for Hyperrectangle {
    fn dim(&self) -> usize {
        self.center.len()
    }

    fn support(&self, direction: &[f64]) -> f64 {
        debug_assert_eq!(direction.len(), self.center.len());
        direction
            .iter()
            .enumerate()
            .map(|(i, d)| self.center[i] * d + self.radii[i] * d.abs())
            .sum()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared-handle constructors.
pub fn void(dim: usize) -> SetRc {
    Rc::new(VoidSet::new(dim))
}

pub fn zero(dim: usize) -> SetRc {
    Rc::new(ZeroSet::new(dim))
}

pub fn ball2(center: Vec<f64>, radius: f64) -> SetRc {
    Rc::new(Ball2::new(center, radius))
}

pub fn ball_inf(center: Vec<f64>, radius: f64) -> SetRc {
    Rc::new(BallInf::new(center, radius))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
