//! Metrics collection.
//!
//! # Metrics
//! - `config_store_reloads_total` (counter): reload attempts by outcome
//! - `config_store_write_timeouts_total` (counter): writers that gave up
//! - `config_store_entries` (gauge): resident cache entries
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; the host application installs
//!   an exporter, otherwise every call is a no-op

/// Record the outcome of one reload attempt.
pub fn record_reload(outcome: &'static str) {
    metrics::counter!("config_store_reloads_total", "outcome" => outcome).increment(1);
}

/// Record a writer that timed out collecting permits.
pub fn record_write_timeout() {
    metrics::counter!("config_store_write_timeouts_total").increment(1);
}

/// Record the number of resident entries.
pub fn record_entries(count: usize) {
    metrics::gauge!("config_store_entries").set(count as f64);
}
