#![doc = include_str!("../README.md")]

//! Engine crate: system descriptors, the matrix-exponential façade, the
//! discretization engine, and block-decomposed reachability with property
//! checking.

pub mod discretize;
pub mod error;
pub mod expmat;
pub mod inputs;
pub mod partition;
pub mod progress;
pub mod reach;
pub mod result;
pub mod system;

pub use discretize::{discretize, ApproxModel, DiscretizeOptions};
pub use error::EngineError;
pub use expmat::{expmat, ExpMode, MatrixExp};
pub use inputs::{InputState, NonDeterministicInput};
pub use partition::{Partition, PartitionElem};
pub use progress::{NoProgress, ProgressSink, TracingProgress};
pub use reach::{check_blocks, check_safety, decompose, CheckOptions, SupportThreshold};
pub use result::SafetyVerdict;
pub use system::{ContinuousSystem, DiscreteSystem, InitialValueProblem};
