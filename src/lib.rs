//! Reloadable configuration store for multi-threaded servers.

pub mod config;
pub mod loader;
pub mod observability;
pub mod store;
pub mod sync;

pub use config::schema::StoreConfig;
pub use store::{CacheError, ConfigCache};
pub use sync::PermitLock;
