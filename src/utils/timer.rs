//! Timer utilities
//!
//! Scoped wall-clock timing for benchmark trials. A timer always finalizes,
//! whether the measured work returns, fails, or panics.

#![allow(dead_code)]

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Scope-bound timer
///
/// `stop` hands the elapsed time back to the caller. A timer dropped without
/// `stop` (early return, unwinding) still logs its elapsed time.
#[derive(Debug)]
pub struct ScopedTimer {
    start: Instant,
    label: String,
    stopped: bool,
}

impl ScopedTimer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
            stopped: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        as_millis(self.elapsed())
    }

    /// Stop timer and return elapsed time
    pub fn stop(mut self) -> Duration {
        let elapsed = self.elapsed();
        self.stopped = true;
        debug!("{}: {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if !self.stopped {
            debug!(
                "{}: {}ms (left scope without stop)",
                self.label,
                self.elapsed().as_millis()
            );
        }
    }
}

/// Panic raised by measured work
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("work panicked: {message}")]
pub struct WorkFault {
    pub message: String,
}

impl WorkFault {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}

/// One timed execution of a unit of work
#[derive(Debug)]
pub struct Sample<R> {
    pub label: String,
    pub elapsed: Duration,
    pub outcome: Result<R, WorkFault>,
}

impl<R> Sample<R> {
    pub fn elapsed_ms(&self) -> u64 {
        as_millis(self.elapsed)
    }

    pub fn is_fault(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Run `work` once on the calling thread and time it.
///
/// A panic inside `work` is caught and returned as the sample's outcome
/// together with the time spent before it.
pub fn measure<R>(label: impl Into<String>, work: impl FnOnce() -> R) -> Sample<R> {
    let timer = ScopedTimer::start(label);
    let outcome = panic::catch_unwind(AssertUnwindSafe(work)).map_err(WorkFault::from_panic);
    let label = timer.label().to_string();
    let elapsed = timer.stop();

    Sample {
        label,
        elapsed,
        outcome,
    }
}

/// Await `work` and time it, with the same fault handling as [`measure`]
pub async fn measure_async<F>(label: impl Into<String>, work: F) -> Sample<F::Output>
where
    F: Future,
{
    let timer = ScopedTimer::start(label);
    let outcome = AssertUnwindSafe(work)
        .catch_unwind()
        .await
        .map_err(WorkFault::from_panic);
    let label = timer.label().to_string();
    let elapsed = timer.stop();

    Sample {
        label,
        elapsed,
        outcome,
    }
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Stopwatch with lap timing
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    /// Create a new stopwatch
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Record a lap
    pub fn lap(&mut self, label: impl Into<String>) {
        let elapsed = self.start.elapsed();
        self.laps.push((label.into(), elapsed));
    }

    /// Get total elapsed time
    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get lap times (duration of each lap, not cumulative)
    pub fn lap_times(&self) -> Vec<(String, Duration)> {
        let mut result = Vec::new();
        let mut prev = Duration::ZERO;

        for (label, cumulative) in &self.laps {
            result.push((label.clone(), *cumulative - prev));
            prev = *cumulative;
        }

        result
    }

    /// Format laps as string
    pub fn format(&self) -> String {
        let mut output = String::new();
        for (label, duration) in self.lap_times() {
            output.push_str(&format!("{}: {}ms\n", label, duration.as_millis()));
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_scoped_timer() {
        let timer = ScopedTimer::start("test");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert!(timer.stop() >= Duration::from_millis(10));
    }

    #[test]
    fn test_measure_returns_value_and_time() {
        let sample = measure("sleep", || {
            sleep(Duration::from_millis(15));
            42
        });
        assert_eq!(sample.label, "sleep");
        assert_eq!(sample.outcome, Ok(42));
        assert!(sample.elapsed_ms() >= 15);
    }

    #[test]
    fn test_measure_times_panicking_work() {
        let sample = measure::<()>("faulty", || {
            sleep(Duration::from_millis(10));
            panic!("boom");
        });
        assert!(sample.is_fault());
        assert_eq!(
            sample.outcome,
            Err(WorkFault {
                message: "boom".to_string()
            })
        );
        assert!(sample.elapsed_ms() >= 10);
    }

    #[test]
    fn test_measure_formatted_panic_message() {
        let sample = measure::<()>("faulty", || panic!("worker {} died", 3));
        assert_eq!(sample.outcome.unwrap_err().message, "worker 3 died");
    }

    #[test]
    fn test_measure_repeatable() {
        let work = || {
            let mut acc = 0u64;
            for i in 0..2_000_000u64 {
                acc = acc.wrapping_add(std::hint::black_box(i));
            }
            sleep(Duration::from_millis(5));
            acc
        };
        let first = measure("first", work);
        let second = measure("second", work);
        assert_eq!(first.outcome, second.outcome);

        let (a, b) = (first.elapsed.as_secs_f64(), second.elapsed.as_secs_f64());
        assert!(a > 0.0 && a.is_finite());
        assert!(b > 0.0 && b.is_finite());
        assert!(a / b < 100.0 && b / a < 100.0);
    }

    #[tokio::test]
    async fn test_measure_async() {
        let sample = measure_async("async", async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "done"
        })
        .await;
        assert_eq!(sample.outcome, Ok("done"));
        assert!(sample.elapsed_ms() >= 10);
    }

    #[test]
    fn test_measure_async_ready_future() {
        let sample = tokio_test::block_on(measure_async("ready", async { 7 }));
        assert_eq!(sample.outcome, Ok(7));
        assert_eq!(sample.label, "ready");
    }

    #[tokio::test]
    async fn test_measure_async_panic() {
        let sample = measure_async("async", async {
            if true {
                panic!("async boom");
            }
        })
        .await;
        assert_eq!(sample.outcome.unwrap_err().message, "async boom");
    }

    #[test]
    fn test_stopwatch() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(10));
        sw.lap("first");
        sleep(Duration::from_millis(10));
        sw.lap("second");

        let lap_times = sw.lap_times();
        assert_eq!(lap_times.len(), 2);
        assert!(lap_times[1].1 >= Duration::from_millis(10));
        assert!(sw.format().ends_with("ms"));
    }
}
