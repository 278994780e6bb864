//! kernel-bench - Sequential vs Parallel Kernel Benchmark
//!
//! A CLI tool that times `C[i] = A[i] + k*B[i]` over large arrays, comparing
//! a single-threaded baseline with a statically-partitioned fork/join
//! implementation across data sizes and worker counts.
//!
//! ## Features
//!
//! - Exact contiguous partitioning, remainder spread over the first workers
//! - Scoped OS threads or tokio blocking tasks as workers
//! - Flat arrays or row-major square matrices
//! - Multiple output formats (Table, JSON, CSV, Histogram)
//!
//! ## Usage
//!
//! ```bash
//! # One size, several thread counts
//! kernel-bench run --size 10000000 --threads 1,2,4,8
//!
//! # Sweep sizes and render a histogram
//! kernel-bench sweep --sizes 100000,1000000 --threads 2,4 --format histogram
//!
//! # 2000x2000 matrix preset
//! kernel-bench run --profile matrix-2000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};

mod benchmark;
mod cli;
mod config;
mod executor;
mod models;
mod output;
mod utils;

use benchmark::BenchmarkRunner;
use cli::{Args, BenchArgs};
use config::{AppConfig, ConfigFile, EnvConfig};
use output::{OutputFormat, ReportFormatter};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        cli::Command::Run(run_args) => {
            let sizes = run_args.size.map(|s| vec![s]).unwrap_or_default();
            let config = resolve_config(args.config.as_deref(), &run_args.bench, sizes)?;
            init_logger(LogLevel::resolve(args.verbose, Some(&config.log_level)));
            run_benchmark(config, &run_args.bench).await?;
        }
        cli::Command::Sweep(sweep_args) => {
            let config =
                resolve_config(args.config.as_deref(), &sweep_args.bench, sweep_args.sizes.clone())?;
            init_logger(LogLevel::resolve(args.verbose, Some(&config.log_level)));
            run_benchmark(config, &sweep_args.bench).await?;
        }
        cli::Command::Config(config_args) => {
            init_logger(LogLevel::resolve(args.verbose, None));
            manage_config(config_args, args.config.as_deref())?;
        }
    }

    Ok(())
}

/// Load the configuration file named on the command line, in
/// `KERNEL_BENCH_CONFIG`, or in a standard location
fn load_config_file(path: Option<&str>, env: &EnvConfig) -> Result<ConfigFile> {
    match path.or(env.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path),
        None => ConfigFile::load_default(),
    }
}

/// Layer file, profile, environment and flags into the effective configuration
fn resolve_config(path: Option<&str>, bench: &BenchArgs, sizes: Vec<usize>) -> Result<AppConfig> {
    let env = EnvConfig::load();
    let file = load_config_file(path, &env)?;

    let mut config = file.app.clone();
    if let Some(name) = &bench.profile {
        let profile = file
            .resolve_profile(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown profile: {name}"))?;
        config = profile.apply(config);
    }

    if env.has_any() {
        debug!("Applying KERNEL_BENCH_* overrides");
    }
    env.apply(&mut config)
        .context("Invalid KERNEL_BENCH_* environment variable")?;
    bench.apply(&mut config)?;
    if !sizes.is_empty() {
        config.sizes = sizes;
    }

    config.validate().context("Invalid benchmark configuration")?;
    Ok(config)
}

async fn run_benchmark(config: AppConfig, bench: &BenchArgs) -> Result<()> {
    let format = OutputFormat::from_str(&config.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", config.format))?;

    info!(
        "Sizes: {:?} ({:?}), threads: {:?}",
        config.sizes, config.layout, config.thread_counts
    );

    let runner = BenchmarkRunner::new(config);
    let report = runner.run().await?;

    let formatter = ReportFormatter::new(format);
    println!("{}", formatter.format_report(&report)?);

    if let Some(output_path) = &bench.output {
        output::write_report_to_file(output_path, &report, format)?;
        println!("Report saved to: {output_path}");
    }

    if report.failures() > 0 {
        anyhow::bail!("{} trial(s) failed", report.failures());
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, path: Option<&str>) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
                println!();
                config::print_env_help();
            } else {
                let env = EnvConfig::load();
                let mut file = load_config_file(path, &env)?;
                env.apply(&mut file.app)?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&file)?
                } else {
                    serde_yaml::to_string(&file)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| path.map(str::to_string))
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./kernel-bench.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Profiles => {
            let env = EnvConfig::load();
            let file = load_config_file(path, &env)?;

            println!("Profiles:");
            println!("{:-<60}", "");
            let mut profiles = file.profiles.clone();
            for builtin in config::BenchProfile::builtin() {
                if !profiles.iter().any(|p| p.name == builtin.name) {
                    profiles.push(builtin);
                }
            }
            for profile in profiles {
                let resolved = profile.apply(file.app.clone());
                println!("  {:15} - {}", profile.name, profile.description);
                println!(
                    "    sizes={:?} layout={:?} threads={:?} repeats={} k={}",
                    resolved.sizes,
                    resolved.layout,
                    resolved.thread_counts,
                    resolved.repeats,
                    resolved.k
                );
            }
        }
    }

    Ok(())
}
