//! Output formatters for benchmark results
//!
//! Provides table, JSON, CSV, and histogram output formats.

use anyhow::{Context, Result};
use std::io::Write;

use crate::models::{BenchRecord, RunReport, TrialStats};

/// Width of the longest histogram bar
const HISTOGRAM_WIDTH: usize = 40;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Histogram,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "histogram" | "hist" => Some(OutputFormat::Histogram),
            _ => None,
        }
    }
}

/// Report formatter
pub struct ReportFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Render a full run report
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        let output = match self.format {
            OutputFormat::Table => self.format_table(report),
            OutputFormat::Json => {
                serde_json::to_string(report).context("Failed to serialize report")?
            }
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(report).context("Failed to serialize report")?
            }
            OutputFormat::Csv => format_csv(&report.records)?,
            OutputFormat::Histogram => self.format_histogram(&report.stats),
        };
        Ok(output)
    }

    fn format_table(&self, report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str("\n┌──────────────────────┬──────────────┬──────┬──────────┬──────────┬──────────┬──────────┐\n");
        output.push_str(&format!(
            "│ {:20} │ {:>12} │ {:>4} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │\n",
            "Label", "Size", "Runs", "Min ms", "Mean ms", "Max ms", "Speedup"
        ));
        output.push_str("├──────────────────────┼──────────────┼──────┼──────────┼──────────┼──────────┼──────────┤\n");

        for stats in &report.stats {
            let speedup = match stats.speedup {
                Some(s) => self.color_speedup(s, format!("{s:>7.2}x")),
                None => format!("{:>8}", "-"),
            };
            let runs = if stats.failures > 0 {
                self.red(format!("{:>4}", format!("{}!", stats.runs)))
            } else {
                format!("{:>4}", stats.runs)
            };

            output.push_str(&format!(
                "│ {:20} │ {:>12} │ {} │ {:>8} │ {:>8.1} │ {:>8} │ {} │\n",
                stats.label,
                stats.shape.to_string(),
                runs,
                stats.min_ms,
                stats.mean_ms,
                stats.max_ms,
                speedup
            ));
        }

        output.push_str("└──────────────────────┴──────────────┴──────┴──────────┴──────────┴──────────┴──────────┘\n");
        output.push_str(&format!(
            " k = {} | strategy = {} | {} trial(s) | {} failure(s)\n",
            report.k,
            report.strategy,
            report.records.len(),
            report.failures()
        ));

        for record in report.records.iter().filter(|r| r.failed()) {
            output.push_str(&format!(
                "   - {} [{}] #{}: {}\n",
                record.label,
                record.shape,
                record.repeat,
                record.error.as_deref().unwrap_or("")
            ));
        }

        output
    }

    /// One bar per configuration, scaled to the slowest mean
    fn format_histogram(&self, stats: &[TrialStats]) -> String {
        let mut output = String::new();
        let slowest = stats.iter().map(|s| s.mean_ms).fold(0.0_f64, f64::max);

        output.push_str(&format!(
            "\n  {:>20} {:>12} {:>10} {}\n",
            "Label", "Size", "Mean ms", "Histogram"
        ));
        output.push_str(&format!("  {:->20} {:->12} {:->10} {:->40}\n", "", "", "", ""));

        for s in stats {
            let bar_len = bar_length(s.mean_ms, slowest);
            let bar = "█".repeat(bar_len);
            let bar = match s.speedup {
                Some(speedup) => self.color_speedup(speedup, bar),
                None => bar,
            };
            output.push_str(&format!(
                "  {:>20} {:>12} {:>10.1} {}\n",
                s.label,
                s.shape.to_string(),
                s.mean_ms,
                bar
            ));
        }

        output
    }

    fn color_speedup(&self, speedup: f64, text: String) -> String {
        if !self.colorize {
            return text;
        }
        if speedup > 1.05 {
            format!("\x1b[32m{text}\x1b[0m")
        } else if speedup >= 0.95 {
            format!("\x1b[33m{text}\x1b[0m")
        } else {
            format!("\x1b[31m{text}\x1b[0m")
        }
    }

    fn red(&self, text: String) -> String {
        if self.colorize {
            format!("\x1b[31m{text}\x1b[0m")
        } else {
            text
        }
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn bar_length(value: f64, max: f64) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value / max) * HISTOGRAM_WIDTH as f64).round() as usize
}

/// Render records as CSV, one row per trial
fn format_csv(records: &[BenchRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "label",
        "shape",
        "elements",
        "threads",
        "strategy",
        "repeat",
        "elapsed_ms",
        "error",
    ])?;

    for r in records {
        writer.write_record([
            r.label.clone(),
            r.shape.to_string(),
            r.shape.len().to_string(),
            r.threads.to_string(),
            r.strategy.to_string(),
            r.repeat.to_string(),
            r.elapsed_ms.to_string(),
            r.error.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Write a report to a file, without terminal colors
pub fn write_report_to_file(path: &str, report: &RunReport, format: OutputFormat) -> Result<()> {
    let formatter = ReportFormatter::new(format).no_color();
    let content = formatter.format_report(report)?;

    let mut file =
        std::fs::File::create(path).with_context(|| format!("Failed to create {path}"))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
