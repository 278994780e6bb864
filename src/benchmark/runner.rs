//! Benchmark execution engine
//!
//! Times the sequential baseline and every configured worker count for each
//! data size, and summarizes the repetitions.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::data::{DataGenerator, Workload};
use crate::config::AppConfig;
use crate::executor::{compute_sequential, KernelError, ParallelExecutor};
use crate::models::{
    parallel_label, BenchRecord, RunReport, Shape, Strategy, TrialStats, SEQUENTIAL_LABEL,
};
use crate::utils::timer::{measure, measure_async, Sample, Stopwatch};

/// Benchmark runner
pub struct BenchmarkRunner {
    config: AppConfig,
}

impl BenchmarkRunner {
    /// Create a new benchmark runner
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run every configured size and return the full report
    pub async fn run(&self) -> Result<RunReport> {
        self.config
            .validate()
            .context("Invalid benchmark configuration")?;

        let started_at = Utc::now();
        let mut generator =
            DataGenerator::new(self.config.value_min, self.config.value_max, self.config.seed);
        let mut stopwatch = Stopwatch::new();
        let mut records = Vec::new();

        info!(
            "Running {} size(s) x {} thread count(s), {} repeat(s), k={}, strategy={}",
            self.config.sizes.len(),
            self.config.thread_counts.len(),
            self.config.repeats,
            self.config.k,
            self.config.strategy
        );

        for shape in self.config.shapes() {
            info!("Generating input for {} ({} elements)", shape, shape.len());
            let workload = generator.workload(shape);
            stopwatch.lap(format!("generate {shape}"));

            records.extend(self.run_workload(&workload).await);
            stopwatch.lap(format!("trials {shape}"));
        }

        debug!("Phase timings:\n{}", stopwatch.format());

        let stats = summarize(&records);
        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            k: self.config.k,
            strategy: self.config.strategy,
            records,
            stats,
        };

        if report.failures() > 0 {
            warn!("{} trial(s) failed", report.failures());
        }

        Ok(report)
    }

    /// Run the baseline and all worker counts against one workload
    pub async fn run_workload(&self, workload: &Workload) -> Vec<BenchRecord> {
        let shape = workload.shape;
        let k = self.config.k;
        let mut records = Vec::new();

        let mut baseline = vec![0; workload.len()];
        let mut baseline_ok = false;
        for repeat in 1..=self.config.repeats {
            let sample = measure(SEQUENTIAL_LABEL, || {
                compute_sequential(&workload.a, &workload.b, &mut baseline, k)
            });
            let record = to_record(
                &sample,
                BenchRecord::sequential(shape, repeat, sample.elapsed_ms()),
            );
            baseline_ok |= !record.failed();
            info!("{} [{}] #{}: {}ms", record.label, shape, repeat, record.elapsed_ms);
            records.push(record);
        }

        let mut output = vec![0; workload.len()];
        for &threads in &self.config.thread_counts {
            let executor = ParallelExecutor::new(threads);
            let label = parallel_label(threads);

            for repeat in 1..=self.config.repeats {
                let sample = match self.config.strategy {
                    Strategy::Threads => measure(&label, || {
                        executor.compute(shape, &workload.a, &workload.b, &mut output, k)
                    }),
                    Strategy::Tasks => {
                        measure_async(
                            &label,
                            executor.compute_async(shape, &workload.a, &workload.b, &mut output, k),
                        )
                        .await
                    }
                };

                let mut record = to_record(
                    &sample,
                    BenchRecord::parallel(
                        shape,
                        threads,
                        self.config.strategy,
                        repeat,
                        sample.elapsed_ms(),
                    ),
                );

                if self.config.verify && baseline_ok && !record.failed() {
                    if let Some(index) = first_mismatch(&baseline, &output) {
                        warn!("{} [{}] differs from baseline at {}", label, shape, index);
                        record = record.with_error(format!(
                            "Output differs from {SEQUENTIAL_LABEL} baseline at index {index}"
                        ));
                    }
                }

                info!("{} [{}] #{}: {}ms", record.label, shape, repeat, record.elapsed_ms);
                records.push(record);
            }
        }

        records
    }
}

/// Attach the outcome of a timed kernel call to its record
fn to_record<T>(sample: &Sample<Result<T, KernelError>>, record: BenchRecord) -> BenchRecord {
    match &sample.outcome {
        Ok(Ok(_)) => record,
        Ok(Err(e)) => {
            warn!("{} failed after {}ms: {}", sample.label, sample.elapsed_ms(), e);
            record.with_error(e.to_string())
        }
        Err(fault) => {
            warn!("{} faulted after {}ms: {}", sample.label, sample.elapsed_ms(), fault);
            record.with_error(fault.to_string())
        }
    }
}

fn first_mismatch(expected: &[i32], actual: &[i32]) -> Option<usize> {
    if expected.len() != actual.len() {
        return Some(expected.len().min(actual.len()));
    }
    expected.iter().zip(actual).position(|(e, a)| e != a)
}

/// Group records by (shape, label) in first-seen order and compute speedups
/// against the baseline of the same shape
pub fn summarize(records: &[BenchRecord]) -> Vec<TrialStats> {
    let mut groups: Vec<((Shape, &str), Vec<&BenchRecord>)> = Vec::new();
    for record in records {
        let key = (record.shape, record.label.as_str());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    let stats: Vec<TrialStats> = groups
        .iter()
        .filter_map(|(_, members)| TrialStats::from_records(members))
        .collect();

    let baseline_mean = |shape: Shape| {
        stats
            .iter()
            .find(|s| {
                s.shape == shape && s.threads == 0 && s.failures < s.runs && s.mean_ms > 0.0
            })
            .map(|s| s.mean_ms)
    };

    stats
        .iter()
        .cloned()
        .map(|s| match baseline_mean(s.shape) {
            Some(mean) => s.with_baseline(mean),
            None => s,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;

    fn small_config() -> AppConfig {
        AppConfig {
            sizes: vec![0, 7, 1000],
            thread_counts: vec![1, 3],
            repeats: 2,
            seed: Some(1),
            verify: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_threads() {
        let report = BenchmarkRunner::new(small_config()).run().await.unwrap();

        assert_eq!(report.records.len(), 3 * 2 * 3);
        assert_eq!(report.failures(), 0);
        assert_eq!(report.k, 5);

        let labels: Vec<_> = report
            .records
            .iter()
            .filter(|r| r.shape == Shape::flat(7))
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "sequential",
                "sequential",
                "parallel(1)",
                "parallel(1)",
                "parallel(3)",
                "parallel(3)"
            ]
        );
        assert_eq!(report.stats.len(), 3 * 3);
    }

    #[tokio::test]
    async fn test_run_tasks_matrix() {
        let config = AppConfig {
            sizes: vec![16],
            layout: Layout::Square,
            strategy: Strategy::Tasks,
            ..small_config()
        };
        let report = BenchmarkRunner::new(config).run().await.unwrap();

        assert_eq!(report.failures(), 0);
        assert!(report
            .records
            .iter()
            .filter(|r| !r.is_baseline())
            .all(|r| r.strategy == Strategy::Tasks && r.shape == Shape::square(16)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = AppConfig {
            thread_counts: vec![0],
            ..small_config()
        };
        assert!(BenchmarkRunner::new(config).run().await.is_err());
    }

    #[test]
    fn test_to_record_marks_kernel_errors() {
        let sample = measure("parallel(0)", || {
            ParallelExecutor::new(0).compute(Shape::flat(1), &[1], &[1], &mut [0], 1)
        });
        let record = to_record(
            &sample,
            BenchRecord::parallel(Shape::flat(1), 0, Strategy::Threads, 1, 0),
        );
        assert_eq!(
            record.error.as_deref(),
            Some("Invalid thread count: 0 (must be at least 1)")
        );
    }

    #[test]
    fn test_to_record_marks_faults() {
        let sample = measure::<Result<(), KernelError>>("faulty", || panic!("lost worker"));
        let record = to_record(&sample, BenchRecord::sequential(Shape::flat(1), 1, 0));
        assert_eq!(record.error.as_deref(), Some("work panicked: lost worker"));
    }

    #[test]
    fn test_first_mismatch() {
        assert_eq!(first_mismatch(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_mismatch(&[1, 2, 3], &[1, 9, 3]), Some(1));
        assert_eq!(first_mismatch(&[1, 2], &[1]), Some(1));
    }

    #[test]
    fn test_summarize_speedup() {
        let shape = Shape::flat(10);
        let records = vec![
            BenchRecord::sequential(shape, 1, 40),
            BenchRecord::sequential(shape, 2, 60),
            BenchRecord::parallel(shape, 4, Strategy::Threads, 1, 20),
            BenchRecord::parallel(shape, 4, Strategy::Threads, 2, 30),
        ];
        let stats = summarize(&records);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "sequential");
        assert_eq!(stats[0].speedup, Some(1.0));
        assert_eq!(stats[1].mean_ms, 25.0);
        assert_eq!(stats[1].speedup, Some(2.0));
    }

    #[test]
    fn test_summarize_sub_millisecond_baseline() {
        let shape = Shape::flat(1000);
        let records = vec![
            BenchRecord::sequential(shape, 1, 0),
            BenchRecord::parallel(shape, 4, Strategy::Threads, 1, 2),
        ];
        let stats = summarize(&records);

        assert_eq!(stats[0].speedup, None);
        assert_eq!(stats[1].mean_ms, 2.0);
        assert_eq!(stats[1].speedup, None);
    }
}
