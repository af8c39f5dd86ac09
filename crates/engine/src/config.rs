//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by resources, global search and dashboard widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// URL prefix of the admin panel. Resource routes are nested under it.
    #[serde(default = "default_panel_path")]
    pub panel_path: String,

    /// Maximum global search results per resource.
    #[serde(default = "default_global_search_limit")]
    pub global_search_limit: usize,

    /// Rows per list page when the request does not say.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound for a requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// How often polling dashboard widgets refresh.
    #[serde(with = "humantime_serde", default = "default_stats_polling_interval")]
    pub stats_polling_interval: Duration,
}

fn default_panel_path() -> String {
    "/admin".to_string()
}

fn default_global_search_limit() -> usize {
    20
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_stats_polling_interval() -> Duration {
    Duration::from_secs(15)
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            panel_path: default_panel_path(),
            global_search_limit: default_global_search_limit(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            stats_polling_interval: default_stats_polling_interval(),
        }
    }
}

impl AdminConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.panel_path.starts_with('/') {
            errors.push(format!(
                "panel_path must start with '/', got '{}'",
                self.panel_path
            ));
        }

        if self.global_search_limit == 0 {
            errors.push("global_search_limit must be at least 1".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("default_page_size must be at least 1".to_string());
        }

        if self.max_page_size < self.default_page_size {
            errors.push(format!(
                "max_page_size ({}) must not be smaller than default_page_size ({})",
                self.max_page_size, self.default_page_size
            ));
        }

        if self.stats_polling_interval.is_zero() {
            errors.push("stats_polling_interval must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AdminConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.global_search_limit, 20);
        assert_eq!(config.stats_polling_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: AdminConfig =
            serde_json::from_str(r#"{"stats_polling_interval": "1m 30s"}"#).unwrap();
        assert_eq!(config.stats_polling_interval, Duration::from_secs(90));
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.panel_path, "/admin");
    }

    #[test]
    fn test_polling_interval_serializes_human_readable() {
        let json = serde_json::to_value(AdminConfig::default()).unwrap();
        assert_eq!(json["stats_polling_interval"], "15s");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = AdminConfig {
            panel_path: "admin".to_string(),
            global_search_limit: 0,
            default_page_size: 50,
            max_page_size: 10,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
