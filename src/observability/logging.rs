//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Define the `Logger` sink the cache reports load failures to
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via settings, overridden by `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sink for load-failure diagnostics.
pub trait Logger: Send + Sync {
    fn write(&self, message: &str);
}

/// Default sink: forwards diagnostics to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn write(&self, message: &str) {
        tracing::error!(target: "config_store::load", "{}", message);
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let fallback = format!("config_store={default_level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
