//! Coordinate partitions.
//!
//! A partition decomposes `0..n` into ordered, contiguous, non-overlapping
//! blocks. Callers may mix ranges and single indices; singletons are
//! promoted to length-1 ranges so the rest of the engine only ever sees
//! ranges.

use std::ops::Range;

use crate::error::EngineError;

/// One caller-facing partition element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionElem {
    /// A single coordinate.
    Index(usize),
    /// A contiguous coordinate range.
    Span(Range<usize>),
}

impl From<usize> for PartitionElem {
    fn from(i: usize) -> Self {
        PartitionElem::Index(i)
    }
}

impl From<Range<usize>> for PartitionElem {
    fn from(r: Range<usize>) -> Self {
        PartitionElem::Span(r)
    }
}

/// An ordered covering of `0..n` by contiguous blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    blocks: Vec<Range<usize>>,
    dim: usize,
}

impl Partition {
    /// Build from ranges; they must tile `0..n` in order with no gaps or
    /// overlaps.
    pub fn from_ranges(blocks: Vec<Range<usize>>) -> Result<Self, EngineError> {
        let mut expected = 0;
        for b in &blocks {
            if b.start != expected {
                return Err(EngineError::DimensionMismatch(format!(
                    "partition block {}..{} does not continue at {expected}",
                    b.start, b.end
                )));
            }
            if b.end <= b.start {
                return Err(EngineError::DimensionMismatch(format!(
                    "empty partition block {}..{}",
                    b.start, b.end
                )));
            }
            expected = b.end;
        }
        Ok(Self {
            blocks,
            dim: expected,
        })
    }

    /// Build from mixed elements, promoting single indices to length-1
    /// ranges.
    pub fn from_elems(elems: Vec<PartitionElem>) -> Result<Self, EngineError> {
        let ranges = elems
            .into_iter()
            .map(|e| match e {
                PartitionElem::Index(i) => i..i + 1,
                PartitionElem::Span(r) => r,
            })
            .collect();
        Self::from_ranges(ranges)
    }

    /// Every coordinate in its own block.
    pub fn singletons(n: usize) -> Self {
        Self {
            blocks: (0..n).map(|i| i..i + 1).collect(),
            dim: n,
        }
    }

    /// Blocks of uniform size; the final block absorbs any remainder.
    pub fn uniform(n: usize, block_size: usize) -> Result<Self, EngineError> {
        if block_size == 0 {
            return Err(EngineError::Domain("block size must be positive".into()));
        }
        let mut blocks = Vec::with_capacity(n.div_ceil(block_size));
        let mut start = 0;
        while start < n {
            let end = (start + block_size).min(n);
            blocks.push(start..end);
            start = end;
        }
        Self::from_ranges(blocks)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total covered dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The `j`-th block.
    pub fn block(&self, j: usize) -> Range<usize> {
        self.blocks[j].clone()
    }

    /// Iterate all blocks in order.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.blocks.iter().cloned()
    }
}
