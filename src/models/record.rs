//! Benchmark result models
//!
//! Defines the per-trial record handed to the presentation layer and the
//! per-configuration summary built from repeated trials.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Shape, Strategy};

/// Label used for the single-threaded baseline
pub const SEQUENTIAL_LABEL: &str = "sequential";

/// Label for a parallel trial with `threads` workers
pub fn parallel_label(threads: usize) -> String {
    format!("parallel({threads})")
}

/// One timed trial
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchRecord {
    pub label: String,
    pub elapsed_ms: u64,
    pub shape: Shape,
    /// Worker count, 0 for the sequential baseline
    pub threads: usize,
    pub strategy: Strategy,
    /// Repetition index, starting at 1
    pub repeat: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BenchRecord {
    pub fn sequential(shape: Shape, repeat: u32, elapsed_ms: u64) -> Self {
        Self {
            label: SEQUENTIAL_LABEL.to_string(),
            elapsed_ms,
            shape,
            threads: 0,
            strategy: Strategy::Threads,
            repeat,
            error: None,
        }
    }

    pub fn parallel(
        shape: Shape,
        threads: usize,
        strategy: Strategy,
        repeat: u32,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            label: parallel_label(threads),
            elapsed_ms,
            shape,
            threads,
            strategy,
            repeat,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_baseline(&self) -> bool {
        self.threads == 0
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Timing summary over the repetitions of one (shape, label) configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialStats {
    pub label: String,
    pub shape: Shape,
    pub threads: usize,
    pub runs: usize,
    pub failures: usize,
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
    /// Baseline mean divided by this mean, when both are known
    pub speedup: Option<f64>,
}

impl TrialStats {
    /// Summarize records belonging to one configuration.
    ///
    /// Failed trials are counted but excluded from the timings.
    pub fn from_records(records: &[&BenchRecord]) -> Option<Self> {
        let first = records.first()?;
        let ok: Vec<u64> = records
            .iter()
            .filter(|r| !r.failed())
            .map(|r| r.elapsed_ms)
            .collect();

        let (min_ms, max_ms, mean_ms) = if ok.is_empty() {
            (0, 0, 0.0)
        } else {
            let sum: u64 = ok.iter().sum();
            (
                ok.iter().copied().min().unwrap_or(0),
                ok.iter().copied().max().unwrap_or(0),
                sum as f64 / ok.len() as f64,
            )
        };

        Some(Self {
            label: first.label.clone(),
            shape: first.shape,
            threads: first.threads,
            runs: records.len(),
            failures: records.len() - ok.len(),
            min_ms,
            max_ms,
            mean_ms,
            speedup: None,
        })
    }

    pub fn with_baseline(mut self, baseline_mean_ms: f64) -> Self {
        if baseline_mean_ms > 0.0 && self.mean_ms > 0.0 && self.failures < self.runs {
            self.speedup = Some(baseline_mean_ms / self.mean_ms);
        }
        self
    }
}

/// Complete output of one benchmark invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub k: i32,
    pub strategy: Strategy,
    pub records: Vec<BenchRecord>,
    pub stats: Vec<TrialStats>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let seq = BenchRecord::sequential(Shape::flat(10), 1, 5);
        assert_eq!(seq.label, "sequential");
        assert!(seq.is_baseline());

        let par = BenchRecord::parallel(Shape::flat(10), 4, Strategy::Tasks, 1, 2);
        assert_eq!(par.label, "parallel(4)");
        assert!(!par.is_baseline());
    }

    #[test]
    fn test_stats_skip_failures() {
        let shape = Shape::flat(100);
        let records = [
            BenchRecord::parallel(shape, 2, Strategy::Threads, 1, 10),
            BenchRecord::parallel(shape, 2, Strategy::Threads, 2, 20),
            BenchRecord::parallel(shape, 2, Strategy::Threads, 3, 99).with_error("boom"),
        ];
        let refs: Vec<_> = records.iter().collect();
        let stats = TrialStats::from_records(&refs).unwrap().with_baseline(30.0);

        assert_eq!(stats.runs, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.min_ms, 10);
        assert_eq!(stats.max_ms, 20);
        assert_eq!(stats.mean_ms, 15.0);
        assert_eq!(stats.speedup, Some(2.0));
    }

    #[test]
    fn test_stats_zero_mean_has_no_speedup() {
        let records = [BenchRecord::sequential(Shape::flat(1), 1, 0)];
        let refs: Vec<_> = records.iter().collect();
        let stats = TrialStats::from_records(&refs).unwrap().with_baseline(0.0);
        assert_eq!(stats.speedup, None);
    }

    #[test]
    fn test_stats_zero_baseline_has_no_speedup() {
        let records = [BenchRecord::parallel(
            Shape::flat(1000),
            4,
            Strategy::Threads,
            1,
            2,
        )];
        let refs: Vec<_> = records.iter().collect();
        let stats = TrialStats::from_records(&refs).unwrap().with_baseline(0.0);
        assert_eq!(stats.speedup, None);
    }

    #[test]
    fn test_stats_empty() {
        assert!(TrialStats::from_records(&[]).is_none());
    }

    #[test]
    fn test_error_not_serialized_when_absent() {
        let record = BenchRecord::sequential(Shape::flat(3), 1, 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("error"));
    }
}
