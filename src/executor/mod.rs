//! Kernel execution engine
//!
//! Provides the sequential baseline and the statically-partitioned
//! fork/join implementation of `C = A + k*B`.

mod parallel;
mod partition;

use thiserror::Error;

pub use parallel::ParallelExecutor;
pub use partition::PartitionPlan;

/// Kernel execution errors
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Invalid thread count: {0} (must be at least 1)")]
    InvalidThreadCount(usize),

    #[error("Length mismatch: A has {a} elements, B has {b}, C has {c}")]
    LengthMismatch { a: usize, b: usize, c: usize },

    #[error("Shape describes {expected} elements but the arrays hold {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("Task for worker {worker} failed: {source}")]
    TaskFailed {
        worker: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Apply the kernel to one chunk. Overflow wraps.
#[inline]
pub(crate) fn apply(a: &[i32], b: &[i32], out: &mut [i32], k: i32) {
    for ((out, &a), &b) in out.iter_mut().zip(a).zip(b) {
        *out = a.wrapping_add(k.wrapping_mul(b));
    }
}

pub(crate) fn check_lengths(a: &[i32], b: &[i32], c: &[i32]) -> Result<(), KernelError> {
    if a.len() != b.len() || a.len() != c.len() {
        return Err(KernelError::LengthMismatch {
            a: a.len(),
            b: b.len(),
            c: c.len(),
        });
    }
    Ok(())
}

/// Single-threaded baseline
pub fn compute_sequential(a: &[i32], b: &[i32], c: &mut [i32], k: i32) -> Result<(), KernelError> {
    check_lengths(a, b, c)?;
    apply(a, b, c, k);
    Ok(())
}
