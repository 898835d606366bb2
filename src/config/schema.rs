//! Settings schema definitions.
//!
//! All types derive Serde traits for deserialization from the settings file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::{CacheSettings, Ttl};

/// Keyword that turns TTL checking off.
pub const TTL_DISABLED: &str = "disabled";

/// Root settings for the config store.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Cache behaviour (source dir, environment, TTL, lock timeout).
    pub cache: CacheConfig,

    /// Source directory watching.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding `<name>.toml` / `<name>.json` sources.
    pub dir: String,

    /// Section merged over `default` in every source.
    pub environment: String,

    /// Seconds before a loaded entry goes stale, or `"disabled"`.
    pub ttl: TtlSetting,

    /// Upper bound on a writer's wait for readers, in seconds.
    pub write_timeout_secs: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: "config".to_string(),
            environment: "development".to_string(),
            ttl: TtlSetting::Seconds(60.0),
            write_timeout_secs: 0.05,
        }
    }
}

impl CacheConfig {
    /// Runtime settings; assumes the config passed validation.
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            dir: PathBuf::from(&self.dir),
            environment: self.environment.clone(),
            ttl: self.ttl.ttl(),
            write_timeout: Duration::from_secs_f64(self.write_timeout_secs.max(0.0)),
        }
    }
}

/// TTL as written in the settings file: a number of seconds or a keyword.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TtlSetting {
    Seconds(f64),
    Keyword(String),
}

impl TtlSetting {
    /// Anything other than a valid number of seconds disables TTL checking.
    pub fn ttl(&self) -> Ttl {
        match self {
            TtlSetting::Seconds(secs) if secs.is_finite() && *secs >= 0.0 => {
                Ttl::from_secs_f64(*secs)
            }
            _ => Ttl::Disabled,
        }
    }
}

/// Settings for the `watch` command.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for backends that poll, in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.cache.dir, "config");
        assert_eq!(config.cache.environment, "development");
        assert_eq!(config.cache.ttl, TtlSetting::Seconds(60.0));
        assert_eq!(config.cache.settings().write_timeout, Duration::from_millis(50));
        assert_eq!(config.watch.poll_interval_secs, 2);
    }

    #[test]
    fn test_ttl_forms() {
        let config: StoreConfig = toml::from_str("[cache]\nttl = \"disabled\"\n").unwrap();
        assert_eq!(config.cache.settings().ttl, Ttl::Disabled);

        let config: StoreConfig = toml::from_str("[cache]\nttl = 2.5\n").unwrap();
        assert_eq!(
            config.cache.settings().ttl,
            Ttl::Window(Duration::from_millis(2500))
        );
    }
}
