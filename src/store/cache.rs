//! Staleness-driven configuration cache.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

use crate::loader::{FileLoader, Loader};
use crate::observability::metrics;
use crate::observability::{Logger, TracingLogger};
use crate::store::entry::{Entry, Ttl};
use crate::store::merge::merge_sections;
use crate::store::path;
use crate::sync::{LockError, PermitLock, DEFAULT_WRITE_TIMEOUT};

/// Errors surfaced to cache callers.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Neither a cached value nor a source exists for the name.
    #[error("no cached value or source for `{0}`")]
    MissingSource(String),

    #[error(transparent)]
    WriteTimeout(#[from] LockError),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Runtime settings for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Directory scanned by `load_all`.
    pub dir: PathBuf,
    /// Section merged over `default`.
    pub environment: String,
    pub ttl: Ttl,
    pub write_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("config"),
            environment: "development".to_string(),
            ttl: Ttl::default(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// What a reload did to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Source was parsed and the entry replaced.
    Refreshed,
    /// Signature matched (or entry still current); only the TTL window restarted.
    Unchanged,
    /// Parse failed; the previous value, if any, was kept.
    Failed,
    /// Source disappeared; the previous value was kept.
    Retained,
    /// Entry was set directly and is never reloaded.
    Skipped,
}

impl ReloadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadOutcome::Refreshed => "refreshed",
            ReloadOutcome::Unchanged => "unchanged",
            ReloadOutcome::Failed => "failed",
            ReloadOutcome::Retained => "retained",
            ReloadOutcome::Skipped => "skipped",
        }
    }
}

/// Per-source outcomes of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub outcomes: Vec<(String, ReloadOutcome)>,
}

impl LoadReport {
    pub fn outcome(&self, name: &str) -> Option<ReloadOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| *outcome)
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == ReloadOutcome::Failed)
            .map(|(name, _)| name.as_str())
    }
}

struct Reloaded {
    outcome: ReloadOutcome,
    value: Option<Arc<Value>>,
}

impl Reloaded {
    fn new(outcome: ReloadOutcome, value: Option<Arc<Value>>) -> Self {
        metrics::record_reload(outcome.as_str());
        Self { outcome, value }
    }
}

/// Named configuration values, reloaded from their sources when stale.
///
/// Lookups run inside a read-scope of the cache's `PermitLock`; reloads and
/// `set` run inside a write-scope, so no reader sees a half-applied update.
///
/// Entries live in a `DashMap`, so a cached read also takes a shard read
/// lock. Every mutation happens under the permit lock, which keeps that shard
/// lock uncontended outside a write-scope.
pub struct ConfigCache {
    lock: PermitLock,
    entries: DashMap<String, Entry>,
    loader: Box<dyn Loader>,
    logger: Arc<dyn Logger>,
    settings: CacheSettings,
}

impl ConfigCache {
    pub fn new(loader: impl Loader + 'static, settings: CacheSettings) -> Self {
        Self {
            lock: PermitLock::with_timeout(settings.write_timeout),
            entries: DashMap::new(),
            loader: Box::new(loader),
            logger: Arc::new(TracingLogger),
            settings,
        }
    }

    /// Cache backed by `FileLoader` rooted at `settings.dir`.
    pub fn from_dir(settings: CacheSettings) -> Self {
        let loader = FileLoader::new(settings.dir.clone());
        Self::new(loader, settings)
    }

    /// Replace the sink that receives load-failure diagnostics.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn lock(&self) -> &PermitLock {
        &self.lock
    }

    /// Value for `name`, reloading it if stale.
    ///
    /// Fails with `MissingSource` when nothing is cached and no source exists.
    /// A source that fails to parse yields its last good value, or `None`.
    pub fn get(&self, name: &str) -> CacheResult<Option<Arc<Value>>> {
        self.fetch(name)
    }

    /// Like `get`, but a missing source yields `None`.
    pub fn get_safe(&self, name: &str) -> CacheResult<Option<Arc<Value>>> {
        match self.fetch(name) {
            Err(CacheError::MissingSource(_)) => Ok(None),
            other => other,
        }
    }

    /// Resolve a dotted path such as `db.replicas.0.host`.
    ///
    /// Missing entries, keys and indexes yield `None`; only a write timeout
    /// is reported as an error.
    pub fn lookup(&self, dotted: &str) -> CacheResult<Option<Value>> {
        let Some((name, segments)) = path::split(dotted) else {
            return Ok(None);
        };
        let Some(root) = self.get_safe(name)? else {
            return Ok(None);
        };
        Ok(path::dig(&root, segments).cloned())
    }

    /// Whether the entry for `name` is resident and within its TTL.
    pub fn is_current(&self, name: &str) -> bool {
        self.lock.read(|| {
            let now = Instant::now();
            self.entries
                .get(name)
                .is_some_and(|entry| entry.is_current(self.settings.ttl, now))
        })
    }

    /// Whether `name` is resident or has a source, without loading it.
    pub fn has(&self, name: &str) -> bool {
        self.lock.read(|| self.entries.contains_key(name)) || self.loader.resolve(name).is_some()
    }

    /// Assign `value` directly; the entry is never reloaded from a source.
    pub fn set(&self, name: &str, value: Value) -> CacheResult<()> {
        self.lock.write(|| {
            self.entries.insert(name.to_string(), Entry::direct(value));
            metrics::record_entries(self.entries.len());
        })?;
        Ok(())
    }

    /// Check the source of `name` now, regardless of TTL.
    pub fn reload(&self, name: &str) -> CacheResult<ReloadOutcome> {
        let reloaded = self.lock.write(|| self.reload_locked(name, true))??;
        Ok(reloaded.outcome)
    }

    /// Reload every source found in the configured directory.
    ///
    /// One failing source never stops the others.
    pub fn load_all(&self) -> CacheResult<LoadReport> {
        let names = match self.loader.list_sources(&self.settings.dir) {
            Ok(names) => names,
            Err(e) => {
                self.logger.write(&format!("cannot list config sources: {e}"));
                return Ok(LoadReport::default());
            }
        };

        let outcomes = self.lock.write(|| {
            names
                .iter()
                .map(|name| {
                    let outcome = match self.reload_locked(name, true) {
                        Ok(reloaded) => reloaded.outcome,
                        Err(_) => ReloadOutcome::Failed,
                    };
                    (name.clone(), outcome)
                })
                .collect::<Vec<_>>()
        })?;

        let report = LoadReport { outcomes };
        tracing::info!(
            dir = %self.settings.dir.display(),
            sources = report.outcomes.len(),
            failed = report.failed().count(),
            "Config sources loaded"
        );
        Ok(report)
    }

    /// Names of resident entries, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock
            .read(|| self.entries.iter().map(|e| e.key().clone()).collect());
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock.read(|| self.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.lock.read(|| self.entries.is_empty())
    }

    /// Check under a read-scope, then reload under a write-scope if needed.
    ///
    /// The write-scope is entered after the read-scope ends, so two threads
    /// escalating at once queue on admission instead of each holding a permit
    /// the other writer needs. A caller already inside a read-scope still
    /// works: the write nests and suspends that caller's permit.
    fn fetch(&self, name: &str) -> CacheResult<Option<Arc<Value>>> {
        let cached = self.lock.read(|| {
            let now = Instant::now();
            self.entries
                .get(name)
                .map(|entry| {
                    let current = entry.is_current(self.settings.ttl, now);
                    (current, Entry::value(&entry).clone())
                })
        });

        match cached {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                let reloaded = self.lock.write(|| self.reload_locked(name, false))??;
                Ok(reloaded.value)
            }
            None => {
                if self.loader.resolve(name).is_none() {
                    return Err(CacheError::MissingSource(name.to_string()));
                }
                let reloaded = self.lock.write(|| self.reload_locked(name, false))??;
                Ok(reloaded.value)
            }
        }
    }

    /// Reload `name`. Callers must hold the write-scope.
    ///
    /// Without `force`, an entry another writer refreshed in the meantime is
    /// returned untouched.
    fn reload_locked(&self, name: &str, force: bool) -> CacheResult<Reloaded> {
        let now = Instant::now();
        let existing = self.entries.get(name).map(|entry| Entry::clone(&entry));

        if let Some(entry) = &existing {
            if entry.is_direct() {
                return Ok(Reloaded::new(ReloadOutcome::Skipped, Some(entry.value().clone())));
            }
            if !force && entry.is_current(self.settings.ttl, now) {
                return Ok(Reloaded::new(ReloadOutcome::Unchanged, Some(entry.value().clone())));
            }
        }

        let Some(location) = self.loader.resolve(name) else {
            return match existing {
                Some(entry) => {
                    tracing::warn!(name, "Config source disappeared, keeping cached value");
                    self.touch(name, now);
                    Ok(Reloaded::new(ReloadOutcome::Retained, Some(entry.value().clone())))
                }
                None => Err(CacheError::MissingSource(name.to_string())),
            };
        };

        let signature = match self.loader.freshness(&location) {
            Ok(signature) => Some(signature),
            Err(e) => {
                tracing::debug!(name, error = %e, "No signature for config source, reparsing");
                None
            }
        };

        if let (Some(entry), Some(signature)) = (&existing, signature) {
            if entry.signature() == Some(signature) {
                self.touch(name, now);
                tracing::debug!(name, "Config source unchanged");
                return Ok(Reloaded::new(ReloadOutcome::Unchanged, Some(entry.value().clone())));
            }
        }

        match self.loader.parse(&location) {
            Ok(document) => {
                let value = Arc::new(merge_sections(document, &self.settings.environment));
                self.entries
                    .insert(name.to_string(), Entry::loaded(value.clone(), signature, now));
                metrics::record_entries(self.entries.len());
                tracing::debug!(name, location = %location, "Config source loaded");
                Ok(Reloaded::new(ReloadOutcome::Refreshed, Some(value)))
            }
            Err(e) => {
                self.logger
                    .write(&format!("failed to load config `{name}` from {location}: {e}"));
                // Keep the old signature so a fixed source is picked up, but
                // wait a full TTL before trying the broken one again.
                self.touch(name, now);
                Ok(Reloaded::new(
                    ReloadOutcome::Failed,
                    existing.map(|entry| entry.value().clone()),
                ))
            }
        }
    }

    fn touch(&self, name: &str, now: Instant) {
        if let Some(mut entry) = self.entries.get_mut(name) {
            entry.touch(now);
        }
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("settings", &self.settings)
            .field("entries", &self.entries.len())
            .field("lock", &self.lock.stats())
            .finish()
    }
}
