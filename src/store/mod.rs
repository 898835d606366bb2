//! Configuration store.
//!
//! # Data Flow
//! ```text
//! get(name)
//!     → read-scope: entry resident and current? → return value
//!     → otherwise write-scope:
//!         → Loader::resolve → Loader::freshness
//!         → signature unchanged? → touch loaded_at
//!         → else Loader::parse → merge default + environment → store
//!         → parse failure → Logger, keep previous value
//! ```
//!
//! # Design Decisions
//! - Entries are only mutated inside a write-scope
//! - Writers re-check currency, so racing readers reparse a source once
//! - Directly set entries are flagged `Direct` and never reloaded
//! - Data failures degrade to stale or absent values; lock timeouts propagate

pub mod cache;
pub mod entry;
pub mod merge;
pub mod path;

pub use cache::{CacheError, CacheResult, CacheSettings, ConfigCache, LoadReport, ReloadOutcome};
pub use entry::{Entry, EntryOrigin, Ttl};
