//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AppConfig, Layout};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./kernel-bench.yaml",
    "./kernel-bench.yml",
    "./.kernel-bench.yaml",
    "~/.config/kernel-bench/config.yaml",
    "~/.kernel-bench.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Benchmark settings
    #[serde(default)]
    pub app: AppConfig,

    /// Named presets selectable with `--profile`
    #[serde(default)]
    pub profiles: Vec<BenchProfile>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            profiles: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::find() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        self.app.validate().context("Invalid app settings")?;

        for profile in &self.profiles {
            profile
                .apply(self.app.clone())
                .validate()
                .with_context(|| format!("Invalid profile '{}'", profile.name))?;
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            profiles: vec![
                BenchProfile::quick(),
                BenchProfile::matrix_2000(),
                BenchProfile::scaling(),
            ],
        }
    }

    /// Get profile by name
    pub fn profile(&self, name: &str) -> Option<&BenchProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Resolve a profile from this file or the built-in presets
    pub fn resolve_profile(&self, name: &str) -> Option<BenchProfile> {
        self.profile(name)
            .cloned()
            .or_else(|| BenchProfile::builtin().into_iter().find(|p| p.name == name))
    }
}

/// Named benchmark preset; unset fields keep the base configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sizes: Option<Vec<usize>>,
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub thread_counts: Option<Vec<usize>>,
    #[serde(default)]
    pub repeats: Option<u32>,
    #[serde(default)]
    pub k: Option<i32>,
}

impl BenchProfile {
    fn named(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            sizes: None,
            layout: None,
            thread_counts: None,
            repeats: None,
            k: None,
        }
    }

    /// Small arrays for a fast sanity run
    pub fn quick() -> Self {
        Self {
            sizes: Some(vec![10_000, 100_000]),
            thread_counts: Some(vec![1, 2, 4]),
            repeats: Some(1),
            ..Self::named("quick", "Small arrays, single repetition")
        }
    }

    /// 2000x2000 matrix, k = 5, 4 threads
    pub fn matrix_2000() -> Self {
        Self {
            sizes: Some(vec![2000]),
            layout: Some(Layout::Square),
            thread_counts: Some(vec![4]),
            k: Some(5),
            ..Self::named("matrix-2000", "Square 2000x2000 matrix with 4 workers")
        }
    }

    /// Growing sizes across a wide thread sweep
    pub fn scaling() -> Self {
        Self {
            sizes: Some(vec![100_000, 1_000_000, 10_000_000, 50_000_000]),
            thread_counts: Some(vec![1, 2, 3, 4, 6, 8, 12, 16]),
            ..Self::named("scaling", "Size and thread-count sweep")
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::quick(), Self::matrix_2000(), Self::scaling()]
    }

    /// Overlay this profile on a base configuration
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(sizes) = &self.sizes {
            config.sizes = sizes.clone();
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(threads) = &self.thread_counts {
            config.thread_counts = threads.clone();
        }
        if let Some(repeats) = self.repeats {
            config.repeats = repeats;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        config
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
