//! Configuration module
//!
//! Handles loading, layering and validating benchmark configuration.
//! Precedence: CLI flags, then `KERNEL_BENCH_*` environment variables, then
//! the configuration file, then built-in defaults.

mod env;
mod file;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Shape, Strategy};
use crate::output::OutputFormat;

pub use env::{print_env_help, EnvConfig};
pub use file::{BenchProfile, ConfigFile};

/// Configuration validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No data sizes configured")]
    NoSizes,

    #[error("No thread counts configured")]
    NoThreadCounts,

    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Repeats must be at least 1")]
    ZeroRepeats,

    #[error("Invalid value range: {min} > {max}")]
    InvalidRange { min: i32, max: i32 },

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Invalid list in {var}: {value:?}")]
    InvalidList { var: String, value: String },
}

/// How a configured size is turned into an array shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Size is the array length
    #[default]
    Flat,
    /// Size is the side of a square row-major matrix
    Square,
}

impl Layout {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flat" | "1d" => Some(Layout::Flat),
            "square" | "matrix" | "2d" => Some(Layout::Square),
            _ => None,
        }
    }

    pub fn shape(self, size: usize) -> Shape {
        match self {
            Layout::Flat => Shape::flat(size),
            Layout::Square => Shape::square(size),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scalar multiplier k
    pub k: i32,

    /// Data sizes to benchmark (length or matrix side, see `layout`)
    pub sizes: Vec<usize>,

    pub layout: Layout,

    /// Worker counts to trial against the sequential baseline
    pub thread_counts: Vec<usize>,

    pub strategy: Strategy,

    /// Timed repetitions per configuration
    pub repeats: u32,

    /// Inclusive range of generated input values
    pub value_min: i32,
    pub value_max: i32,

    /// Fixed RNG seed for reproducible inputs
    pub seed: Option<u64>,

    /// Compare every parallel result against the baseline
    pub verify: bool,

    /// Output format (table, json, json-pretty, csv, histogram)
    pub format: String,

    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            k: 5,
            sizes: vec![1_000_000, 10_000_000],
            layout: Layout::Flat,
            thread_counts: vec![1, 2, 4, 8],
            strategy: Strategy::Threads,
            repeats: 3,
            value_min: 1,
            value_max: 100,
            seed: None,
            verify: false,
            format: "table".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Shapes to benchmark, in configured order
    pub fn shapes(&self) -> Vec<Shape> {
        self.sizes.iter().map(|&s| self.layout.shape(s)).collect()
    }

    /// Check the configuration before any benchmark runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizes.is_empty() {
            return Err(ConfigError::NoSizes);
        }
        if self.thread_counts.is_empty() {
            return Err(ConfigError::NoThreadCounts);
        }
        if self.thread_counts.contains(&0) {
            return Err(ConfigError::ZeroThreads);
        }
        if self.repeats == 0 {
            return Err(ConfigError::ZeroRepeats);
        }
        if self.value_min > self.value_max {
            return Err(ConfigError::InvalidRange {
                min: self.value_min,
                max: self.value_max,
            });
        }
        if OutputFormat::from_str(&self.format).is_none() {
            return Err(ConfigError::UnknownFormat(self.format.clone()));
        }
        Ok(())
    }
}

/// Parse a comma-separated list such as `1,2,4,8`
pub fn parse_list<T: std::str::FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.replace('_', "").parse().ok())
        .collect()
}
