//! Block-decomposed reachability with property checking.
//!
//! Propagates the discrete abstraction `x_{k+1} = Φ x_k ⊕ V` projected onto
//! a coordinate partition, evaluating a safety property on the Cartesian
//! product of the queried blocks at every step. Per-step sets are lazy
//! Minkowski sums; the set library evaluates them only when the property
//! queries a support value.
//!
//! The power `Φᵏ` advances differently per backend: dense multiplies into
//! a pre-sized scratch buffer, sparse multiplies sparsely, and the lazy
//! exponential adds its generator onto the stored exponent so row
//! extraction answers against the next power.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ndarray::Array2;

use flowpipe_mat::{mat_mul_into, CsrMatrix, LazyMatrixExp, Matrix};
use flowpipe_sets::{
    linear_map, minkowski_sum, CartesianProductArray, LazySet, MinkowskiSumArray, SetRc,
};

use crate::error::EngineError;
use crate::expmat::MatrixExp;
use crate::inputs::NonDeterministicInput;
use crate::partition::Partition;
use crate::progress::ProgressSink;
use crate::result::SafetyVerdict;

/// Options for the checking loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Stop at the first violating step instead of computing all `N` steps.
    /// Either way the returned index is the earliest violation.
    pub eager_checking: bool,
    /// For the lazy backend: skip all-zero sub-blocks of the extracted
    /// rows instead of pre-sizing a full sum array.
    pub assume_sparse: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            eager_checking: true,
            assume_sparse: false,
        }
    }
}

/// Ready-made safety property: the support of the observed blocks along a
/// fixed direction stays at or below a bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportThreshold {
    pub direction: Vec<f64>,
    pub bound: f64,
}

impl SupportThreshold {
    pub fn new(direction: Vec<f64>, bound: f64) -> Self {
        Self { direction, bound }
    }

    /// Evaluate against the Cartesian product of the queried blocks.
    pub fn check(&self, set: &CartesianProductArray) -> bool {
        debug_assert_eq!(self.direction.len(), set.dim());
        set.support(&self.direction) <= self.bound
    }
}

/// Project a full-dimensional set onto every partition block.
///
/// The result feeds [`check_blocks`] as the per-block initial sets; each
/// projection is a lazy linear map by the block's standard projection
/// matrix.
pub fn decompose(set: &SetRc, partition: &Partition) -> Vec<SetRc> {
    let n = partition.dim();
    partition
        .iter()
        .map(|b| {
            let proj = Rc::new(Matrix::Sparse(CsrMatrix::projection(b, n)));
            linear_map(proj, set.clone())
        })
        .collect()
}

/// The power `Φᵏ`, advanced in place between steps.
enum PhiPower<'a> {
    Dense {
        current: Array2<f64>,
        scratch: Array2<f64>,
        base: &'a Array2<f64>,
    },
    Sparse {
        current: CsrMatrix,
        base: &'a CsrMatrix,
    },
    Lazy {
        current: LazyMatrixExp,
        base: &'a LazyMatrixExp,
    },
}

impl<'a> PhiPower<'a> {
    fn new(phi: &'a MatrixExp) -> Self {
        match phi {
            MatrixExp::Dense(m) => PhiPower::Dense {
                current: m.clone(),
                scratch: Array2::zeros(m.dim()),
                base: m,
            },
            MatrixExp::Sparse(m) => PhiPower::Sparse {
                current: m.clone(),
                base: m,
            },
            MatrixExp::Lazy(e) => PhiPower::Lazy {
                current: e.clone(),
                base: e,
            },
        }
    }

    /// Rows `rows` of `Φᵏ` across all columns. The lazy backend
    /// materializes exactly these rows.
    fn row_block(&self, rows: std::ops::Range<usize>) -> Matrix {
        match self {
            PhiPower::Dense { current, .. } => {
                Matrix::Dense(current.slice(ndarray::s![rows, ..]).to_owned())
            }
            PhiPower::Sparse { current, .. } => {
                Matrix::Sparse(current.block(rows, 0..current.ncols()))
            }
            PhiPower::Lazy { current, .. } => Matrix::Dense(current.rows(rows)),
        }
    }

    /// True when zero sub-blocks should be skipped while accumulating.
    fn sparse_fast_path(&self, assume_sparse: bool) -> bool {
        match self {
            PhiPower::Dense { .. } => false,
            PhiPower::Sparse { .. } => true,
            PhiPower::Lazy { .. } => assume_sparse,
        }
    }

    /// Advance to `Φᵏ⁺¹`.
    fn advance(&mut self) {
        match self {
            PhiPower::Dense {
                current,
                scratch,
                base,
            } => {
                mat_mul_into(scratch, current, base);
                std::mem::swap(current, scratch);
            }
            PhiPower::Sparse { current, base } => {
                *current = current.mat_mul(base);
            }
            PhiPower::Lazy { current, base } => {
                current.advance(base.exponent());
            }
        }
    }
}

/// Check a safety property along the block-decomposed reach sequence.
///
/// `x0` holds one set per partition block; `blocks` selects which blocks
/// the property observes (in that order). Returns `0` iff the property
/// holds at every step `1..=num_steps`, otherwise the earliest violating
/// step — under `eager_checking` the loop stops there, otherwise it runs
/// to `num_steps` and still reports the earliest.
///
/// `over_approx_inputs(step, block, set)` may simplify the accumulated
/// input term to keep its representation bounded over long horizons; use
/// the identity closure to opt out.
#[allow(clippy::too_many_arguments)]
pub fn check_blocks<P, W>(
    phi: &MatrixExp,
    x0: &[SetRc],
    u: Option<&NonDeterministicInput>,
    over_approx_inputs: &W,
    n: usize,
    num_steps: usize,
    blocks: &[usize],
    partition: &Partition,
    opts: &CheckOptions,
    property: &P,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<usize, EngineError>
where
    P: Fn(&CartesianProductArray) -> bool,
    W: Fn(usize, usize, SetRc) -> SetRc,
{
    validate(phi, x0, n, num_steps, blocks, partition)?;

    if let Some(sink) = progress.as_deref_mut() {
        sink.start(num_steps, (num_steps / 100).max(1), "check_blocks");
    }

    // Step 1: the property on the initial blocks.
    let initial = CartesianProductArray::new(
        blocks.iter().map(|&b| x0[b].clone()).collect(),
    );
    let mut violation_index = 0;
    if !property(&initial) {
        if opts.eager_checking {
            debug!(step = 1, "property violated");
            return Ok(1);
        }
        violation_index = 1;
    }
    if num_steps == 1 {
        return Ok(violation_index);
    }

    let u1 = u.map(|u| u.start().set);
    let mut phi_k = PhiPower::new(phi);
    let skip_zero_blocks = phi_k.sparse_fast_path(opts.assume_sparse);

    // Step 3: initial per-block input terms, projected from full dimension.
    let mut w_sets: Option<Vec<SetRc>> = u1.as_ref().map(|u1| {
        blocks
            .iter()
            .map(|&b| {
                let proj = Rc::new(Matrix::Sparse(CsrMatrix::projection(
                    partition.block(b),
                    n,
                )));
                over_approx_inputs(1, b, linear_map(proj, u1.clone()))
            })
            .collect()
    });

    let mut row_blocks: Vec<Matrix> = Vec::with_capacity(blocks.len());
    for k in 2..=num_steps {
        // (a) Accumulate the projected successor per queried block.
        row_blocks.clear();
        let mut step_sets: Vec<SetRc> = Vec::with_capacity(blocks.len());
        for (qi, &b) in blocks.iter().enumerate() {
            let bi = partition.block(b);
            let rows = phi_k.row_block(bi.clone());
            let mut sum = MinkowskiSumArray::with_capacity(partition.len() + 1);
            for j in 0..partition.len() {
                let bj = partition.block(j);
                if skip_zero_blocks && rows.block_is_zero(0..bi.len(), bj.clone()) {
                    continue;
                }
                let sub = Rc::new(rows.block(0..bi.len(), bj));
                sum.push(linear_map(sub, x0[j].clone()));
            }
            if let Some(w) = &w_sets {
                sum.push(w[qi].clone());
            }
            step_sets.push(Rc::new(sum));
            row_blocks.push(rows);
        }

        // (b) Evaluate the property.
        if !property(&CartesianProductArray::new(step_sets)) {
            if opts.eager_checking {
                debug!(step = k, "property violated");
                return Ok(k);
            }
            if violation_index == 0 {
                violation_index = k;
            }
        }
        if let Some(sink) = progress.as_deref_mut() {
            sink.update(k);
        }
        if k == num_steps {
            break;
        }

        // (c) Fold the next input contribution into each block term.
        if let (Some(w), Some(u1)) = (&mut w_sets, &u1) {
            for (qi, &b) in blocks.iter().enumerate() {
                let mapped = linear_map(Rc::new(row_blocks[qi].clone()), u1.clone());
                w[qi] = over_approx_inputs(k, b, minkowski_sum(w[qi].clone(), mapped));
            }
        }

        // (d) Advance the power.
        phi_k.advance();
    }

    debug!(violation_index, num_steps, "check complete");
    Ok(violation_index)
}

/// [`check_blocks`] with the result wrapped in a [`SafetyVerdict`].
#[allow(clippy::too_many_arguments)]
pub fn check_safety<P, W>(
    phi: &MatrixExp,
    x0: &[SetRc],
    u: Option<&NonDeterministicInput>,
    over_approx_inputs: &W,
    n: usize,
    num_steps: usize,
    blocks: &[usize],
    partition: &Partition,
    opts: &CheckOptions,
    property: &P,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<SafetyVerdict, EngineError>
where
    P: Fn(&CartesianProductArray) -> bool,
    W: Fn(usize, usize, SetRc) -> SetRc,
{
    let index = check_blocks(
        phi,
        x0,
        u,
        over_approx_inputs,
        n,
        num_steps,
        blocks,
        partition,
        opts,
        property,
        progress,
    )?;
    Ok(SafetyVerdict::from_violation_index(index, num_steps))
}

fn validate(
    phi: &MatrixExp,
    x0: &[SetRc],
    n: usize,
    num_steps: usize,
    blocks: &[usize],
    partition: &Partition,
) -> Result<(), EngineError> {
    if num_steps == 0 {
        return Err(EngineError::Domain("step count must be at least 1".into()));
    }
    if partition.dim() != n {
        return Err(EngineError::DimensionMismatch(format!(
            "partition covers {} coordinates, system has {n}",
            partition.dim()
        )));
    }
    if phi.dim() != n {
        return Err(EngineError::DimensionMismatch(format!(
            "transition matrix is {}-dimensional, system has {n}",
            phi.dim()
        )));
    }
    if x0.len() != partition.len() {
        return Err(EngineError::DimensionMismatch(format!(
            "{} initial block sets for a partition of {} blocks",
            x0.len(),
            partition.len()
        )));
    }
    for (j, s) in x0.iter().enumerate() {
        let expected = partition.block(j).len();
        if s.dim() != expected {
            return Err(EngineError::DimensionMismatch(format!(
                "initial set of block {j} has dimension {}, block spans {expected}",
                s.dim()
            )));
        }
    }
    if blocks.is_empty() {
        return Err(EngineError::Domain("no blocks queried".into()));
    }
    if let Some(&bad) = blocks.iter().find(|&&b| b >= partition.len()) {
        return Err(EngineError::DimensionMismatch(format!(
            "queried block {bad} out of range for a partition of {} blocks",
            partition.len()
        )));
    }
    Ok(())
}
