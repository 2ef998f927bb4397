//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::duration::Duration;

/// Default transcription service address
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub poll_interval: Option<String>,
    pub max_poll_failures: Option<u32>,
    pub request_timeout: Option<String>,
    pub notify: Option<bool>,
    pub output_dir: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            poll_interval: Some("3s".to_string()),
            max_poll_failures: None,
            request_timeout: None,
            notify: Some(false),
            output_dir: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_url: other.api_url.or(self.api_url),
            poll_interval: other.poll_interval.or(self.poll_interval),
            max_poll_failures: other.max_poll_failures.or(self.max_poll_failures),
            request_timeout: other.request_timeout.or(self.request_timeout),
            notify: other.notify.or(self.notify),
            output_dir: other.output_dir.or(self.output_dir),
        }
    }

    /// Get the service base URL, or the default if not set
    pub fn api_url_or_default(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    /// Get poll_interval as parsed Duration, or default if not set/invalid
    pub fn poll_interval_or_default(&self) -> Duration {
        self.poll_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_poll_interval)
    }

    /// Get the consecutive poll failure ceiling; `None` retries forever
    pub fn max_poll_failures(&self) -> Option<u32> {
        self.max_poll_failures.filter(|n| *n > 0)
    }

    /// Get request_timeout as parsed Duration, if set and valid
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.poll_interval.as_deref(), Some("3s"));
        assert!(config.max_poll_failures.is_none());
        assert!(config.request_timeout.is_none());
        assert_eq!(config.notify, Some(false));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.api_url.is_none());
        assert!(config.poll_interval.is_none());
        assert!(config.notify.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            api_url: Some("http://base".to_string()),
            poll_interval: Some("3s".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            api_url: Some("http://other".to_string()),
            poll_interval: None,
            max_poll_failures: Some(5),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.api_url.as_deref(), Some("http://other"));
        assert_eq!(merged.poll_interval.as_deref(), Some("3s"));
        assert_eq!(merged.max_poll_failures, Some(5));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            notify: Some(true),
            output_dir: Some("/tmp/minutes".to_string()),
            ..Default::default()
        };
        let merged = base.merge(AppConfig::empty());
        assert_eq!(merged.notify, Some(true));
        assert_eq!(merged.output_dir.as_deref(), Some("/tmp/minutes"));
    }

    #[test]
    fn api_url_or_default_ignores_blank() {
        let config = AppConfig {
            api_url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_url_or_default(), DEFAULT_API_URL);
    }

    #[test]
    fn poll_interval_or_default_parses() {
        let config = AppConfig {
            poll_interval: Some("500ms".to_string()),
            ..Default::default()
        };
        assert_eq!(config.poll_interval_or_default().as_millis(), 500);
    }

    #[test]
    fn poll_interval_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            poll_interval: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.poll_interval_or_default().as_millis(), 3000);
    }

    #[test]
    fn zero_failure_ceiling_means_unbounded() {
        let config = AppConfig {
            max_poll_failures: Some(0),
            ..Default::default()
        };
        assert!(config.max_poll_failures().is_none());
    }

    #[test]
    fn request_timeout_parses_when_set() {
        let config = AppConfig {
            request_timeout: Some("30s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.request_timeout().map(|d| d.as_secs()), Some(30));
        assert!(AppConfig::empty().request_timeout().is_none());
    }

    #[test]
    fn boolean_defaults() {
        assert!(!AppConfig::empty().notify_or_default());
    }
}
