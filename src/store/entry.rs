//! Cache entries and TTL policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::loader::Signature;

/// Time-to-live for loader-sourced entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entries never go stale.
    Disabled,
    /// Entries go stale once older than the window.
    Window(Duration),
}

impl Ttl {
    pub fn from_secs_f64(secs: f64) -> Self {
        Ttl::Window(Duration::from_secs_f64(secs))
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Ttl::Window(Duration::from_secs(60))
    }
}

/// How an entry's value got into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Assigned through `set`; never reloaded.
    Direct,
    /// Loaded from a source.
    Source {
        loaded_at: Instant,
        signature: Option<Signature>,
    },
}

/// One named value held by the cache.
#[derive(Debug, Clone)]
pub struct Entry {
    value: Arc<Value>,
    origin: EntryOrigin,
}

impl Entry {
    pub fn direct(value: Value) -> Self {
        Self {
            value: Arc::new(value),
            origin: EntryOrigin::Direct,
        }
    }

    pub fn loaded(value: Arc<Value>, signature: Option<Signature>, loaded_at: Instant) -> Self {
        Self {
            value,
            origin: EntryOrigin::Source {
                loaded_at,
                signature,
            },
        }
    }

    pub fn value(&self) -> &Arc<Value> {
        &self.value
    }

    pub fn origin(&self) -> EntryOrigin {
        self.origin
    }

    pub fn is_direct(&self) -> bool {
        self.origin == EntryOrigin::Direct
    }

    pub fn signature(&self) -> Option<Signature> {
        match self.origin {
            EntryOrigin::Source { signature, .. } => signature,
            EntryOrigin::Direct => None,
        }
    }

    pub fn loaded_at(&self) -> Option<Instant> {
        match self.origin {
            EntryOrigin::Source { loaded_at, .. } => Some(loaded_at),
            EntryOrigin::Direct => None,
        }
    }

    /// Direct entries are always current; sourced ones until their TTL lapses.
    pub fn is_current(&self, ttl: Ttl, now: Instant) -> bool {
        match (self.origin, ttl) {
            (EntryOrigin::Direct, _) => true,
            (EntryOrigin::Source { .. }, Ttl::Disabled) => true,
            (EntryOrigin::Source { loaded_at, .. }, Ttl::Window(window)) => {
                now.saturating_duration_since(loaded_at) <= window
            }
        }
    }

    /// Restart the TTL window without touching the value.
    pub fn touch(&mut self, now: Instant) {
        if let EntryOrigin::Source { loaded_at, .. } = &mut self.origin {
            *loaded_at = now;
        }
    }
}
