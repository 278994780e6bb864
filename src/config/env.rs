//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::str::FromStr;

use super::{parse_list, AppConfig, ConfigError, Layout};
use crate::models::Strategy;

/// Environment variable prefix
const ENV_PREFIX: &str = "KERNEL_BENCH";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Scalar from KERNEL_BENCH_K
    pub k: Option<i32>,
    /// Sizes from KERNEL_BENCH_SIZES (comma-separated)
    pub sizes: Option<Vec<usize>>,
    /// Layout from KERNEL_BENCH_LAYOUT
    pub layout: Option<String>,
    /// Thread counts from KERNEL_BENCH_THREADS (comma-separated)
    pub thread_counts: Option<Vec<usize>>,
    /// Strategy from KERNEL_BENCH_STRATEGY
    pub strategy: Option<String>,
    /// Repeats from KERNEL_BENCH_REPEATS
    pub repeats: Option<u32>,
    /// Seed from KERNEL_BENCH_SEED
    pub seed: Option<u64>,
    /// Verify from KERNEL_BENCH_VERIFY
    pub verify: Option<bool>,
    /// Output format from KERNEL_BENCH_FORMAT
    pub format: Option<String>,
    /// Config file from KERNEL_BENCH_CONFIG
    pub config_file: Option<String>,
    /// Log level from KERNEL_BENCH_LOG
    pub log_level: Option<String>,
    /// List variables that failed to parse, as (variable, raw value)
    pub malformed: Vec<(String, String)>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        let mut malformed = Vec::new();
        let sizes = get_env_list("SIZES", &mut malformed);
        let thread_counts = get_env_list("THREADS", &mut malformed);

        Self {
            k: get_env_parse("K"),
            sizes,
            layout: get_env("LAYOUT"),
            thread_counts,
            strategy: get_env("STRATEGY"),
            repeats: get_env_parse("REPEATS"),
            seed: get_env_parse("SEED"),
            verify: get_env_bool("VERIFY"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
            malformed,
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.k.is_some()
            || self.sizes.is_some()
            || self.layout.is_some()
            || self.thread_counts.is_some()
            || self.strategy.is_some()
            || self.repeats.is_some()
            || self.seed.is_some()
            || self.verify.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
            || !self.malformed.is_empty()
    }

    /// Overlay the set variables on `config`
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some((var, value)) = self.malformed.first() {
            return Err(ConfigError::InvalidList {
                var: var.clone(),
                value: value.clone(),
            });
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(sizes) = &self.sizes {
            config.sizes = sizes.clone();
        }
        if let Some(layout) = &self.layout {
            config.layout = Layout::from_str(layout)
                .ok_or_else(|| ConfigError::UnknownLayout(layout.clone()))?;
        }
        if let Some(threads) = &self.thread_counts {
            config.thread_counts = threads.clone();
        }
        if let Some(strategy) = &self.strategy {
            config.strategy = Strategy::from_str(strategy)
                .ok_or_else(|| ConfigError::UnknownStrategy(strategy.clone()))?;
        }
        if let Some(repeats) = self.repeats {
            config.repeats = repeats;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(verify) = self.verify {
            config.verify = verify;
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(())
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_K:         {:?}", ENV_PREFIX, self.k);
        println!("  {}_SIZES:     {:?}", ENV_PREFIX, self.sizes);
        println!("  {}_LAYOUT:    {:?}", ENV_PREFIX, self.layout);
        println!("  {}_THREADS:   {:?}", ENV_PREFIX, self.thread_counts);
        println!("  {}_STRATEGY:  {:?}", ENV_PREFIX, self.strategy);
        println!("  {}_REPEATS:   {:?}", ENV_PREFIX, self.repeats);
        println!("  {}_SEED:      {:?}", ENV_PREFIX, self.seed);
        println!("  {}_VERIFY:    {:?}", ENV_PREFIX, self.verify);
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:       {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get a comma-separated environment variable, noting it in `malformed`
/// when it does not parse
fn get_env_list<T: FromStr>(
    name: &str,
    malformed: &mut Vec<(String, String)>,
) -> Option<Vec<T>> {
    let value = get_env(name)?;
    let parsed = parse_list(&value);
    if parsed.is_none() {
        malformed.push((format!("{ENV_PREFIX}_{name}"), value));
    }
    parsed
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all KERNEL_BENCH environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_K          Scalar multiplier k");
    println!("  {ENV_PREFIX}_SIZES      Data sizes (comma-separated)");
    println!("  {ENV_PREFIX}_LAYOUT     Size interpretation (flat, square)");
    println!("  {ENV_PREFIX}_THREADS    Thread counts (comma-separated)");
    println!("  {ENV_PREFIX}_STRATEGY   Worker strategy (threads, tasks)");
    println!("  {ENV_PREFIX}_REPEATS    Repetitions per configuration");
    println!("  {ENV_PREFIX}_SEED       RNG seed for input data");
    println!("  {ENV_PREFIX}_VERIFY     Check parallel output against baseline (true/false)");
    println!("  {ENV_PREFIX}_FORMAT     Output format (table, json, csv, histogram)");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!("  {ENV_PREFIX}_LOG        Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_THREADS=1,2,4,8");
    println!("  kernel-bench sweep");
}
