//! Workload description models
//!
//! Defines array shapes and worker dispatch strategies.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of the benchmarked arrays
///
/// Matrices are stored row-major in a flat buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Shape {
    Flat { len: usize },
    Matrix { rows: usize, cols: usize },
}

impl Shape {
    pub fn flat(len: usize) -> Self {
        Shape::Flat { len }
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Shape::Matrix { rows, cols }
    }

    /// Square matrix of side `n`
    pub fn square(n: usize) -> Self {
        Shape::Matrix { rows: n, cols: n }
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        match self {
            Shape::Flat { len } => *len,
            Shape::Matrix { rows, cols } => rows * cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Flat { len } => write!(f, "{len}"),
            Shape::Matrix { rows, cols } => write!(f, "{rows}x{cols}"),
        }
    }
}

/// How parallel workers are created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Scoped OS threads, one per partition
    #[default]
    Threads,
    /// Blocking tasks on the tokio runtime, awaited together
    Tasks,
}

impl Strategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "threads" | "thread" => Some(Strategy::Threads),
            "tasks" | "task" | "async" => Some(Strategy::Tasks),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Threads => "threads",
            Strategy::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
