//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{StoreConfig, TtlSetting};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `cache.dir`.
pub const ENV_DIR: &str = "CONFIG_STORE_DIR";
/// Environment variable overriding `cache.environment`.
pub const ENV_ENVIRONMENT: &str = "CONFIG_STORE_ENV";
/// Environment variable overriding `cache.ttl` (seconds or `disabled`).
pub const ENV_TTL: &str = "CONFIG_STORE_TTL";

/// Error type for settings loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, override from the process environment, and validate settings.
pub fn load_settings(path: &Path) -> Result<StoreConfig, ConfigError> {
    resolve_settings(Some(path), |_| {})
}

/// Defaults, overridden from the process environment, validated.
pub fn default_settings() -> Result<StoreConfig, ConfigError> {
    resolve_settings(None, |_| {})
}

/// Build settings from `path` (or defaults), then `CONFIG_STORE_*` variables,
/// then `adjust`, and validate the result.
///
/// `adjust` carries the highest-precedence overrides (command-line flags), so
/// they are validated like every other source.
pub fn resolve_settings(
    path: Option<&Path>,
    adjust: impl FnOnce(&mut StoreConfig),
) -> Result<StoreConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => StoreConfig::default(),
    };
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    adjust(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `CONFIG_STORE_*` overrides using `lookup` to read variables.
pub fn apply_overrides(config: &mut StoreConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = lookup(ENV_DIR) {
        config.cache.dir = dir;
    }
    if let Some(environment) = lookup(ENV_ENVIRONMENT) {
        config.cache.environment = environment;
    }
    if let Some(ttl) = lookup(ENV_TTL) {
        config.cache.ttl = match ttl.trim().parse::<f64>() {
            Ok(secs) => TtlSetting::Seconds(secs),
            Err(_) => TtlSetting::Keyword(ttl.trim().to_string()),
        };
    }
}
