//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! sync, store, config produce:
//!     → tracing events (debug on load, warn on timeout)
//!     → logging.rs Logger (load-failure diagnostics)
//!     → metrics.rs (reload counters, entry gauge)
//! ```
//!
//! # Design Decisions
//! - The cache never writes diagnostics directly; it goes through `Logger`
//! - Metrics are cheap facade calls

pub mod logging;
pub mod metrics;

pub use logging::{Logger, TracingLogger};
