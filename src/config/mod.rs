//! Settings management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse, CONFIG_STORE_* overrides)
//!     → validation.rs (semantic checks)
//!     → StoreConfig → CacheSettings
//!     → ConfigCache
//!
//! On source change:
//!     watcher.rs detects change under cache.dir
//!     → ConfigCache::reload(name)
//!     → ReloadEvent on the update channel
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal settings files
//! - Validation separates syntactic (serde) from semantic checks
//! - A broken source never replaces a good cached value

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, resolve_settings, ConfigError};
pub use schema::{CacheConfig, StoreConfig, TtlSetting};
pub use validation::ValidationError;
pub use watcher::{ReloadEvent, SourceWatcher};
