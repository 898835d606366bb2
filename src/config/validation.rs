//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTL >= 0, write timeout > 0)
//! - Reject environment names that collide with the `default` section
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StoreConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are handed to the cache

use thiserror::Error;

use crate::config::schema::{StoreConfig, TtlSetting, TTL_DISABLED};
use crate::store::merge::DEFAULT_SECTION;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("cache.dir must not be empty")]
    EmptyDir,

    #[error("cache.environment must not be empty")]
    EmptyEnvironment,

    #[error("cache.environment must not be `default`")]
    ReservedEnvironment,

    #[error("cache.ttl must be a non-negative number of seconds, got {0}")]
    InvalidTtl(f64),

    #[error("cache.ttl keyword must be `disabled`, got `{0}`")]
    UnknownTtlKeyword(String),

    #[error("cache.write_timeout_secs must be a positive number, got {0}")]
    InvalidWriteTimeout(f64),

    #[error("watch.poll_interval_secs must be greater than zero")]
    ZeroPollInterval,
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &StoreConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let cache = &config.cache;

    if cache.dir.trim().is_empty() {
        errors.push(ValidationError::EmptyDir);
    }

    let environment = cache.environment.trim();
    if environment.is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    } else if environment == DEFAULT_SECTION {
        errors.push(ValidationError::ReservedEnvironment);
    }

    match &cache.ttl {
        TtlSetting::Seconds(secs) if !secs.is_finite() || *secs < 0.0 => {
            errors.push(ValidationError::InvalidTtl(*secs));
        }
        TtlSetting::Keyword(keyword) if keyword != TTL_DISABLED => {
            errors.push(ValidationError::UnknownTtlKeyword(keyword.clone()));
        }
        _ => {}
    }

    if !cache.write_timeout_secs.is_finite() || cache.write_timeout_secs <= 0.0 {
        errors.push(ValidationError::InvalidWriteTimeout(cache.write_timeout_secs));
    }

    if config.watch.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
