//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::{AppConfig, Layout};
use crate::models::Strategy;

/// Sequential vs parallel C = A + k*B benchmark
#[derive(Parser, Debug)]
#[command(name = "kernel-bench")]
#[command(version)]
#[command(about = "Benchmark a sequential and a statically-partitioned parallel C = A + k*B")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Benchmark a single data size
    Run(RunArgs),

    /// Benchmark every combination of sizes and thread counts
    Sweep(SweepArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Array length (or matrix side with --layout square)
    #[arg(short = 'n', long)]
    pub size: Option<usize>,

    #[command(flatten)]
    pub bench: BenchArgs,
}

/// Arguments for sweep command
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Sizes to sweep (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub sizes: Vec<usize>,

    #[command(flatten)]
    pub bench: BenchArgs,
}

/// Options shared by run and sweep
#[derive(ClapArgs, Debug, Default)]
pub struct BenchArgs {
    /// Thread counts to trial (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub threads: Vec<usize>,

    /// Scalar multiplier
    #[arg(short, long, allow_negative_numbers = true)]
    pub k: Option<i32>,

    /// Size interpretation (flat, square)
    #[arg(long)]
    pub layout: Option<String>,

    /// Worker strategy (threads, tasks)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Repetitions per configuration
    #[arg(short, long)]
    pub repeats: Option<u32>,

    /// RNG seed for reproducible inputs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Check every parallel result against the sequential baseline
    #[arg(long)]
    pub verify: bool,

    /// Output format (table, json, json-pretty, csv, histogram)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save the report to a file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Named profile from the config file or built-ins (quick, matrix-2000, scaling)
    #[arg(short, long)]
    pub profile: Option<String>,
}

impl BenchArgs {
    /// Overlay the flags that were given on `config`
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if !self.threads.is_empty() {
            config.thread_counts = self.threads.clone();
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(layout) = &self.layout {
            config.layout = Layout::from_str(layout)
                .ok_or_else(|| anyhow::anyhow!("Unknown layout: {layout}"))?;
        }
        if let Some(strategy) = &self.strategy {
            config.strategy = Strategy::from_str(strategy)
                .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {strategy}"))?;
        }
        if let Some(repeats) = self.repeats {
            config.repeats = repeats;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.verify {
            config.verify = true;
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        Ok(())
    }
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./kernel-bench.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// Path to validate (defaults to the discovered file)
        file: Option<String>,
    },

    /// List available profiles
    Profiles,
}
