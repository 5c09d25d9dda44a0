//! Configuration loading, validation, and management for pagetrack.
//!
//! Loads configuration from `~/.pagetrack/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use pagetrack_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `endpoint`.
pub const ENV_ENDPOINT: &str = "PAGETRACK_ENDPOINT";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "PAGETRACK_LOG_LEVEL";

/// The root configuration structure.
///
/// Maps directly to `~/.pagetrack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the collector service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Path events are POSTed to
    #[serde(default = "default_track_path")]
    pub track_path: String,

    /// Path diagnostic log lines are POSTed to
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Mirror diagnostic messages to `log_path`
    #[serde(default = "default_true")]
    pub remote_log: bool,

    /// Per-request timeout for collector calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry behavior for failed deliveries
    #[serde(default)]
    pub retry: RetryConfig,

    /// Auto-seed from host-page elements
    #[serde(default)]
    pub seed: SeedConfig,

    /// Local logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_track_path() -> String {
    "/track".into()
}
fn default_log_path() -> String {
    "/js-log".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per event, 0 = unlimited
    #[serde(default)]
    pub max_attempts: u32,

    /// Delay before a failed delivery is re-enqueued
    #[serde(default)]
    pub backoff_ms: u64,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Attribute marking the element to seed a product event from
    #[serde(default = "default_marker_attribute")]
    pub marker_attribute: String,
}

fn default_marker_attribute() -> String {
    "data-track-product".into()
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_attribute: default_marker_attribute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the default path, with env var overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process env in `load`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pagetrack")
    }

    /// Full URL events are POSTed to.
    pub fn track_url(&self) -> String {
        join_url(&self.endpoint, &self.track_path)
    }

    /// Full URL diagnostic records are POSTed to.
    pub fn log_url(&self) -> String {
        join_url(&self.endpoint, &self.log_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        for (name, path) in [("track_path", &self.track_path), ("log_path", &self.log_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.seed.marker_attribute.is_empty() {
            return Err(ConfigError::ValidationError(
                "seed.marker_attribute must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            track_path: default_track_path(),
            log_path: default_log_path(),
            remote_log: true,
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
            seed: SeedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.track_path, "/track");
        assert_eq!(config.log_path, "/js-log");
        assert!(config.remote_log);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = TrackerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: TrackerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.endpoint, config.endpoint);
        assert_eq!(parsed.seed.marker_attribute, "data-track-product");
    }

    #[test]
    fn urls_join_without_double_slash() {
        let config = TrackerConfig {
            endpoint: "https://collector.example.com/".into(),
            ..TrackerConfig::default()
        };
        assert_eq!(config.track_url(), "https://collector.example.com/track");
        assert_eq!(config.log_url(), "https://collector.example.com/js-log");
    }

    #[test]
    fn invalid_settings_rejected() {
        let bad_endpoint = TrackerConfig {
            endpoint: "collector.example.com".into(),
            ..TrackerConfig::default()
        };
        assert!(bad_endpoint.validate().is_err());

        let bad_path = TrackerConfig {
            track_path: "track".into(),
            ..TrackerConfig::default()
        };
        assert!(bad_path.validate().is_err());

        let zero_timeout = TrackerConfig {
            request_timeout_secs: 0,
            ..TrackerConfig::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn retry_zero_means_unlimited() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy, RetryPolicy::unbounded());

        let limited = RetryConfig {
            max_attempts: 5,
            backoff_ms: 250,
        }
        .to_policy();
        assert_eq!(limited.max_attempts, Some(5));
        assert_eq!(limited.backoff, Duration::from_millis(250));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "https://edge.example.com"),
            (ENV_LOG_LEVEL, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = TrackerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.endpoint, "https://edge.example.com");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = TrackerConfig::default();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.endpoint, default_endpoint());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = TrackerConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
endpoint = "https://collector.example.com"
remote_log = false

[retry]
max_attempts = 4
"#,
        )
        .unwrap();

        let config = TrackerConfig::load_from(&path).unwrap();
        assert_eq!(config.endpoint, "https://collector.example.com");
        assert!(!config.remote_log);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.backoff_ms, 0);
        assert_eq!(config.track_path, "/track");
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpoint = [").unwrap();
        assert!(matches!(
            TrackerConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = TrackerConfig::default_toml();
        assert!(toml_str.contains("/track"));
        assert!(toml_str.contains("data-track-product"));
    }
}
