//! Data models for kernel benchmarking
//!
//! This module contains all data structures shared between the runner and
//! the output layer.

mod record;
mod workload;

pub use record::{parallel_label, BenchRecord, RunReport, TrialStats, SEQUENTIAL_LABEL};
pub use workload::{Shape, Strategy};
