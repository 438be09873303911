//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.studentflow.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".studentflow.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Where records come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Low-score relay settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Encryption settings.
    #[serde(default)]
    pub crypto: CryptoConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Record source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the JSON document holding the student list.
    #[serde(default = "default_source_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Load records from this file instead of fetching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_seconds: default_timeout(),
            input: None,
        }
    }
}

fn default_source_url() -> String {
    "https://api.slingacademy.com/v1/sample-data/files/student-scores.json".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Low-score relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Whether flagged records are posted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint receiving the batch.
    #[serde(default = "default_relay_url")]
    pub url: String,

    /// Scores strictly below this value are flagged.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_relay_url(),
            threshold: default_threshold(),
        }
    }
}

fn default_relay_url() -> String {
    "https://httpbin.org/post".to_string()
}

fn default_threshold() -> f64 {
    65.0
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving every output file.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Render the subject chart.
    #[serde(default = "default_true")]
    pub chart: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            chart: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Encryption settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// 64 hex characters. A random key is generated when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.source_url {
            self.source.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
        if let Some(ref input) = args.input {
            self.source.input = Some(input.clone());
        }

        if let Some(ref url) = args.relay_url {
            self.relay.url = url.clone();
        }
        if let Some(threshold) = args.threshold {
            self.relay.threshold = threshold;
        }
        if args.no_relay {
            self.relay.enabled = false;
        }

        if let Some(ref dir) = args.output_dir {
            self.output.dir = dir.clone();
        }
        if args.no_chart {
            self.output.chart = false;
        }

        if let Some(ref key) = args.key {
            self.crypto.key = Some(key.clone());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then `--verbose` or
    /// `[general] verbose`, then INFO.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        match args.log_level() {
            tracing::Level::INFO if self.general.verbose => tracing::Level::DEBUG,
            level => level,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
