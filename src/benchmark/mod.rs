//! Benchmarking module
//!
//! Generates input data and times the sequential and parallel kernels
//! across sizes and worker counts.

mod data;
mod runner;

pub use data::{DataGenerator, Workload};
pub use runner::{summarize, BenchmarkRunner};
