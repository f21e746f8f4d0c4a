//! Configuration for the stream summary agent.
//!
//! Settings come from three layers, each overriding the previous one: the
//! JSON config file, environment variables, and command line flags. The
//! result is validated once into an immutable [`PipelineConfig`].

use crate::core::histogram::BinningConfig;
use crate::pipeline::{PipelineConfig, SinkFailurePolicy};
use crate::sink::file::OutputFormat;
use crate::sink::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Records per window
    pub window_size: usize,

    /// Histogram bins and range
    pub binning: BinningConfig,

    /// Summarize the trailing partial window at end of stream
    pub flush_partial: bool,

    /// Stop the run on the first sink failure
    pub fail_fast: bool,

    /// Where and how summaries are written
    pub sink: SinkConfig,

    /// Path for storing activity stats
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stream-summary-agent");

        Self {
            window_size: 100,
            binning: BinningConfig::default(),
            flush_partial: false,
            fail_fast: false,
            sink: SinkConfig {
                output_path: data_dir.join("summarized"),
                ..SinkConfig::default()
            },
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stream-summary-agent")
            .join("config.json")
    }

    /// Path of the persisted activity stats.
    pub fn activity_path(&self) -> PathBuf {
        self.data_path.join("activity.json")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognized variables: `BATCH_SIZE`, `NUM_BINS`, `LOWER_BOUND`,
    /// `UPPER_BOUND` and `OUTPUT_PATH`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parse_var::<usize>(&lookup, "BATCH_SIZE")? {
            self.window_size = size;
        }

        let num_bins = parse_var::<usize>(&lookup, "NUM_BINS")?;
        let lower = parse_var::<f64>(&lookup, "LOWER_BOUND")?;
        let upper = parse_var::<f64>(&lookup, "UPPER_BOUND")?;
        if num_bins.is_some() || lower.is_some() || upper.is_some() {
            self.binning = BinningConfig::new(
                num_bins.unwrap_or(self.binning.num_bins()),
                lower.unwrap_or(self.binning.lower_bound()),
                upper.unwrap_or(self.binning.upper_bound()),
            )?;
        }

        if let Some(path) = lookup("OUTPUT_PATH").filter(|p| !p.trim().is_empty()) {
            self.sink.output_path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Validate and freeze the settings the pipeline driver needs.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let window_size = NonZeroUsize::new(self.window_size)
            .ok_or_else(|| ConfigError::Invalid("window_size must be at least 1".to_string()))?;

        Ok(PipelineConfig {
            window_size,
            binning: self.binning,
            flush_partial: self.flush_partial,
            sink_failure_policy: if self.fail_fast {
                SinkFailurePolicy::FailFast
            } else {
                SinkFailurePolicy::Continue
            },
        })
    }

    /// Ensure the data directory exists.
    ///
    /// The output directory is created by [`FileSink`](crate::sink::FileSink)
    /// only when summaries are written to files.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Where summaries go and how delivery failures are retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory receiving summary files
    pub output_path: PathBuf,
    /// File layout
    pub format: OutputFormat,
    /// Total delivery attempts per summary
    pub max_attempts: u32,
    /// Wait before the first retry
    pub backoff_ms: u64,
    /// Growth factor of the wait between retries
    pub backoff_multiplier: f64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("summarized"),
            format: OutputFormat::Json,
            max_attempts: 3,
            backoff_ms: 200,
            backoff_multiplier: 2.0,
        }
    }
}

impl SinkConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.backoff_ms),
            multiplier: self.backoff_multiplier,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{key}={raw:?}: {e}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_size, 100);
        assert_eq!(config.binning.num_bins(), 10);
        assert_eq!(config.binning.lower_bound(), 0.0);
        assert_eq!(config.binning.upper_bound(), 50.0);
        assert!(!config.flush_partial);
        assert!(config.sink.output_path.ends_with("summarized"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("BATCH_SIZE", "25"),
                ("NUM_BINS", "4"),
                ("UPPER_BOUND", "8"),
                ("OUTPUT_PATH", "/tmp/summaries"),
            ]))
            .unwrap();

        assert_eq!(config.window_size, 25);
        assert_eq!(config.binning.num_bins(), 4);
        assert_eq!(config.binning.lower_bound(), 0.0);
        assert_eq!(config.binning.upper_bound(), 8.0);
        assert_eq!(config.sink.output_path, PathBuf::from("/tmp/summaries"));
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(config.apply_overrides(env(&[("BATCH_SIZE", "many")])).is_err());

        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("LOWER_BOUND", "60")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_pipeline_config_validation() {
        let mut config = Config::default();
        config.window_size = 0;
        assert!(config.pipeline_config().is_err());

        config.window_size = 5;
        config.fail_fast = true;
        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline.window_size.get(), 5);
        assert_eq!(pipeline.sink_failure_policy, SinkFailurePolicy::FailFast);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.window_size, config.window_size);
        assert_eq!(parsed.binning, config.binning);
        assert_eq!(parsed.sink.format, OutputFormat::Json);
    }

    #[test]
    fn test_ensure_directories_leaves_output_alone() {
        let root = std::env::temp_dir().join("stream-summary-config-dirs");
        let _ = std::fs::remove_dir_all(&root);

        let mut config = Config::default();
        config.data_path = root.join("data");
        config.sink.output_path = root.join("summarized");
        config.ensure_directories().unwrap();

        assert!(config.data_path.is_dir());
        assert!(!config.sink.output_path.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_retry_policy_from_sink_config() {
        let sink = SinkConfig {
            max_attempts: 0,
            ..SinkConfig::default()
        };
        let policy = sink.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_backoff, Duration::from_millis(200));
    }
}
