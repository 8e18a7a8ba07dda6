//! Environment variable overrides
//!
//! | Variable | Setting |
//! |---|---|
//! | `SLACK_WEBHOOK_URL` | `alerts.webhook_url` (empty = unset) |
//! | `ACTIVE_POOL` | `detection.active_pool` |
//! | `ERROR_RATE_THRESHOLD` | `detection.error_rate_threshold` |
//! | `WINDOW_SIZE` | `detection.window_size` |
//! | `ALERT_COOLDOWN_SEC` | `alerts.cooldown_seconds` |
//! | `MAINTENANCE_MODE` | `alerts.maintenance_mode` (`true`, any case) |
//! | `LOG_FILE_PATH` | `source.log_path` |

use super::{normalize_url, Config};
use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to read variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if a numeric variable does not
    /// parse.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SLACK_WEBHOOK_URL") {
            self.alerts.webhook_url = normalize_url(Some(url));
        }
        if let Some(pool) = lookup("ACTIVE_POOL") {
            self.detection.active_pool = pool.trim().to_string();
        }
        if let Some(raw) = lookup("ERROR_RATE_THRESHOLD") {
            self.detection.error_rate_threshold = parse_var("ERROR_RATE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("WINDOW_SIZE") {
            self.detection.window_size = parse_var("WINDOW_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("ALERT_COOLDOWN_SEC") {
            self.alerts.cooldown_seconds = parse_var("ALERT_COOLDOWN_SEC", &raw)?;
        }
        if let Some(raw) = lookup("MAINTENANCE_MODE") {
            self.alerts.maintenance_mode = raw.trim().eq_ignore_ascii_case("true");
        }
        if let Some(path) = lookup("LOG_FILE_PATH") {
            if !path.trim().is_empty() {
                self.source.log_path = PathBuf::from(path.trim());
            }
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{} has an invalid value: '{}'", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_every_setting() {
        let mut config = Config::default();
        config
            .apply_env_from(lookup_from(&[
                ("SLACK_WEBHOOK_URL", "https://hooks.example.com/abc"),
                ("ACTIVE_POOL", "green"),
                ("ERROR_RATE_THRESHOLD", "5.5"),
                ("WINDOW_SIZE", "50"),
                ("ALERT_COOLDOWN_SEC", "60"),
                ("MAINTENANCE_MODE", "TRUE"),
                ("LOG_FILE_PATH", "/srv/logs/access.log"),
            ]))
            .unwrap();

        assert_eq!(
            config.alerts.webhook_url.as_deref(),
            Some("https://hooks.example.com/abc")
        );
        assert_eq!(config.detection.active_pool, "green");
        assert_eq!(config.detection.error_rate_threshold, 5.5);
        assert_eq!(config.detection.window_size, 50);
        assert_eq!(config.alerts.cooldown_seconds, 60);
        assert!(config.alerts.maintenance_mode);
        assert_eq!(config.source.log_path, PathBuf::from("/srv/logs/access.log"));
    }

    #[test]
    fn test_absent_env_keeps_file_values() {
        let mut config = Config::from_toml_str("[detection]\nactive_pool = \"green\"\n").unwrap();
        config.apply_env_from(lookup_from(&[])).unwrap();
        assert_eq!(config.detection.active_pool, "green");
    }

    #[test]
    fn test_empty_webhook_env_disables_alerting() {
        let mut config =
            Config::from_toml_str("[alerts]\nwebhook_url = \"https://hooks.example.com/x\"\n")
                .unwrap();
        config
            .apply_env_from(lookup_from(&[("SLACK_WEBHOOK_URL", "")]))
            .unwrap();
        assert!(!config.webhook_configured());
    }

    #[test]
    fn test_maintenance_mode_only_true_enables() {
        for (raw, expected) in [("true", true), ("True", true), ("1", false), ("yes", false), ("false", false)] {
            let mut config = Config::default();
            config
                .apply_env_from(lookup_from(&[("MAINTENANCE_MODE", raw)]))
                .unwrap();
            assert_eq!(config.alerts.maintenance_mode, expected, "value {}", raw);
        }
    }

    #[test]
    fn test_unparseable_number_is_validation_error() {
        let mut config = Config::default();
        let result = config.apply_env_from(lookup_from(&[("WINDOW_SIZE", "lots")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result = config.apply_env_from(lookup_from(&[("ERROR_RATE_THRESHOLD", "2%")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
