//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use config_store::loader::{LoadError, Loader, Signature, SourceLocation};
use config_store::observability::Logger;
use parking_lot::Mutex;
use serde_json::Value;

/// In-memory source: a version (its signature) and a document, or `None` to fail parsing.
#[derive(Debug, Clone)]
struct MockSource {
    version: u64,
    document: Option<Value>,
}

/// Loader backed by a map, counting every call.
#[derive(Debug, Default)]
pub struct MockLoader {
    sources: Mutex<HashMap<String, MockSource>>,
    pub resolves: AtomicUsize,
    pub parses: AtomicUsize,
}

#[allow(dead_code)]
impl MockLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add or replace a source that parses to `document`.
    pub fn put(&self, name: &str, version: u64, document: Value) {
        self.sources.lock().insert(
            name.to_string(),
            MockSource {
                version,
                document: Some(document),
            },
        );
    }

    /// Add or replace a source whose parse fails.
    pub fn put_broken(&self, name: &str, version: u64) {
        self.sources.lock().insert(
            name.to_string(),
            MockSource {
                version,
                document: None,
            },
        );
    }

    pub fn parses(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }
}

impl Loader for MockLoader {
    fn list_sources(&self, _dir: &Path) -> Result<Vec<String>, LoadError> {
        let mut names: Vec<String> = self.sources.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn resolve(&self, name: &str) -> Option<SourceLocation> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.sources
            .lock()
            .contains_key(name)
            .then(|| SourceLocation::new(name))
    }

    fn freshness(&self, location: &SourceLocation) -> Result<Signature, LoadError> {
        match self.sources.lock().get(&location.to_string()) {
            Some(source) => Ok(Signature::from(
                UNIX_EPOCH + Duration::from_secs(source.version),
            )),
            None => Err(LoadError::Invalid {
                location: location.clone(),
                message: "gone".into(),
            }),
        }
    }

    fn parse(&self, location: &SourceLocation) -> Result<Value, LoadError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        match self.sources.lock().get(&location.to_string()) {
            Some(MockSource {
                document: Some(document),
                ..
            }) => Ok(document.clone()),
            _ => Err(LoadError::Invalid {
                location: location.clone(),
                message: "syntax error".into(),
            }),
        }
    }
}

/// Logger that records every message.
#[derive(Debug, Default)]
pub struct CollectingLogger {
    messages: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CollectingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Logger for CollectingLogger {
    fn write(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Fresh, empty directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("config-store-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
