//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables (see [`env`]), then command-line flags.

pub mod env;

use crate::aggregator::DEFAULT_WINDOW_SIZE;
use crate::alerts::cooldown::DEFAULT_COOLDOWN_SECONDS;
use crate::alerts::notifier::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted alert cooldown (one year)
pub const MAX_COOLDOWN_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub detection: DetectionConfig,
    pub alerts: AlertConfig,
}

/// Where log lines come from and how often to poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Access log to follow
    pub log_path: PathBuf,
    /// Idle delay between polls when no new line is available
    pub poll_interval_ms: u64,
    /// Log a statistics line every this many requests
    pub summary_interval: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/var/log/nginx/monitoring.log"),
            poll_interval_ms: 100,
            summary_interval: 100,
        }
    }
}

/// Detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pool expected to serve traffic
    pub active_pool: String,
    /// Error rate (percent) above which an alert fires
    pub error_rate_threshold: f64,
    /// Number of requests in the error-rate window
    pub window_size: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            active_pool: "blue".to_string(),
            error_rate_threshold: 2.0,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Alert delivery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Webhook endpoint; alerts are dropped when unset
    pub webhook_url: Option<String>,
    /// Minimum seconds between two deliveries of one category
    pub cooldown_seconds: u64,
    /// Suppress every outbound notification
    pub maintenance_mode: bool,
    /// Bound on a single delivery
    pub timeout_seconds: u64,
    /// Display name for posted messages
    pub username: String,
    pub icon_emoji: String,
    /// Value of the fixed "Action" field
    pub runbook_hint: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS as u64,
            maintenance_mode: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            username: "poolwatch".to_string(),
            icon_emoji: ":robot_face:".to_string(),
            runbook_hint: "See runbook.md for response procedures".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read and
    /// `ConfigError::TomlError` if it is not valid TOML for this schema.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.alerts.webhook_url = normalize_url(config.alerts.webhook_url.take());
        Ok(config)
    }

    /// Whether alerts have somewhere to go
    pub fn webhook_configured(&self) -> bool {
        self.alerts.webhook_url.is_some()
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.active_pool.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "detection.active_pool must not be empty".to_string(),
            ));
        }
        if self.detection.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "detection.window_size must be at least 1".to_string(),
            ));
        }
        let threshold = self.detection.error_rate_threshold;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(format!(
                "detection.error_rate_threshold must be between 0 and 100, got {}",
                threshold
            )));
        }
        if self.alerts.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "alerts.cooldown_seconds must be at most {}, got {}",
                MAX_COOLDOWN_SECONDS, self.alerts.cooldown_seconds
            )));
        }
        if self.alerts.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "alerts.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.source.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "source.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.source.summary_interval == 0 {
            return Err(ConfigError::ValidationError(
                "source.summary_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl AlertConfig {
    /// Cooldown as a duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the value does not fit a
    /// `chrono::Duration`.
    pub fn cooldown(&self) -> Result<Duration, ConfigError> {
        i64::try_from(self.cooldown_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "alerts.cooldown_seconds is out of range: {}",
                    self.cooldown_seconds
                ))
            })
    }
}

/// Treat blank webhook URLs as unset
pub(crate) fn normalize_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_allow_zero_config_startup() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.active_pool, "blue");
        assert_eq!(config.detection.error_rate_threshold, 2.0);
        assert_eq!(config.detection.window_size, 200);
        assert_eq!(config.alerts.cooldown_seconds, 300);
        assert_eq!(config.alerts.timeout_seconds, 5);
        assert!(!config.alerts.maintenance_mode);
        assert!(!config.webhook_configured());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [detection]
            active_pool = "green"
            window_size = 50

            [alerts]
            webhook_url = "https://hooks.example.com/T000/B000"
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.active_pool, "green");
        assert_eq!(config.detection.window_size, 50);
        assert_eq!(config.detection.error_rate_threshold, 2.0);
        assert_eq!(config.alerts.cooldown_seconds, 300);
        assert!(config.webhook_configured());
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        let config = Config::from_toml_str("[alerts]\nwebhook_url = \"  \"\n").unwrap();
        assert!(!config.webhook_configured());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = Config::from_toml_str("[detection]\nwindow_size = \"many\"\n");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[source]\nlog_path = \"/tmp/access.log\"\npoll_interval_ms = 250").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.source.log_path, PathBuf::from("/tmp/access.log"));
        assert_eq!(config.source.poll_interval_ms, 250);
        assert_eq!(config.source.summary_interval, 100);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = Config::from_file(Path::new("/nonexistent/poolwatch.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.detection.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.error_rate_threshold = 150.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.error_rate_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detection.active_pool = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alerts.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cooldown_upper_bound() {
        let mut config = Config::default();
        config.alerts.cooldown_seconds = MAX_COOLDOWN_SECONDS;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.alerts.cooldown().unwrap(),
            Duration::seconds(MAX_COOLDOWN_SECONDS as i64)
        );

        for huge in [MAX_COOLDOWN_SECONDS + 1, 10_000_000_000_000_000, u64::MAX] {
            config.alerts.cooldown_seconds = huge;
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "{} accepted",
                huge
            );
        }
    }

    #[test]
    fn test_cooldown_out_of_range_is_error_not_panic() {
        let mut alerts = AlertConfig::default();
        assert_eq!(alerts.cooldown().unwrap(), Duration::seconds(300));

        alerts.cooldown_seconds = 10_000_000_000_000_000;
        assert!(matches!(alerts.cooldown(), Err(ConfigError::ValidationError(_))));

        alerts.cooldown_seconds = u64::MAX;
        assert!(matches!(alerts.cooldown(), Err(ConfigError::ValidationError(_))));
    }
}
