//! Static work partitioning
//!
//! Splits an index range into contiguous, near-equal chunks, one per worker.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::KernelError;

/// Ordered set of disjoint half-open ranges covering `[0, len)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    len: usize,
    ranges: Vec<Range<usize>>,
}

impl PartitionPlan {
    /// Partition `len` elements across `workers` workers.
    ///
    /// Every worker receives `len / workers` elements and the first
    /// `len % workers` workers receive one extra. When `workers > len` the
    /// trailing ranges are empty.
    pub fn new(len: usize, workers: usize) -> Result<Self, KernelError> {
        if workers == 0 {
            return Err(KernelError::InvalidThreadCount(workers));
        }

        let base = len / workers;
        let remainder = len % workers;

        let mut ranges = Vec::with_capacity(workers);
        let mut start = 0;
        for worker in 0..workers {
            let grain = base + usize::from(worker < remainder);
            ranges.push(start..start + grain);
            start += grain;
        }
        debug_assert_eq!(start, len);

        Ok(Self { len, ranges })
    }

    /// Partition a row-major `rows x cols` matrix so every worker owns whole rows
    pub fn over_rows(rows: usize, cols: usize, workers: usize) -> Result<Self, KernelError> {
        let by_row = Self::new(rows, workers)?;
        let ranges = by_row
            .ranges
            .into_iter()
            .map(|r| r.start * cols..r.end * cols)
            .collect();

        Ok(Self {
            len: rows * cols,
            ranges,
        })
    }

    /// Total number of elements covered
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of workers the plan was built for
    pub fn workers(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Grain size of each partition, in worker order
    pub fn grain_sizes(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.len()).collect()
    }

    /// Split `out` into one exclusive sub-slice per partition.
    ///
    /// Callers must pass a slice of exactly `self.len()` elements.
    pub fn split_mut<'a, T>(&self, mut out: &'a mut [T]) -> Vec<&'a mut [T]> {
        debug_assert_eq!(out.len(), self.len);

        let mut chunks = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let (head, tail) = std::mem::take(&mut out).split_at_mut(range.len());
            chunks.push(head);
            out = tail;
        }
        chunks
    }
}
