//! Source directory watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::loader::FileLoader;
use crate::store::{ConfigCache, ReloadOutcome};

/// Result of a watcher-triggered reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub name: String,
    pub outcome: Result<ReloadOutcome, String>,
}

/// A watcher that reloads cache entries when their source files change.
pub struct SourceWatcher {
    dir: PathBuf,
    cache: Arc<ConfigCache>,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl SourceWatcher {
    /// Create a new SourceWatcher for the cache's source directory.
    ///
    /// Returns the watcher and a receiver for reload events.
    pub fn new(
        cache: Arc<ConfigCache>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                dir: cache.settings().dir.clone(),
                cache,
                poll_interval,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching; the returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let cache = self.cache.clone();
        let tx = self.update_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => handle_event(&cache, &event, &tx),
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?self.dir, "Source watcher started");
        Ok(watcher)
    }
}

/// Reload every source named by `event`'s paths.
pub(crate) fn handle_event(
    cache: &ConfigCache,
    event: &Event,
    tx: &mpsc::UnboundedSender<ReloadEvent>,
) {
    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return;
    }

    let mut names: Vec<String> = event
        .paths
        .iter()
        .filter_map(|path| FileLoader::source_name(path))
        .collect();
    names.dedup();

    for name in names {
        tracing::info!(name = %name, "Config source change detected, reloading...");
        let outcome = cache.reload(&name).map_err(|e| {
            tracing::error!(name = %name, error = %e, "Failed to reload config source. Keeping current value.");
            e.to_string()
        });
        let _ = tx.send(ReloadEvent { name, outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheSettings, Ttl};
    use notify::event::{AccessKind, EventKind, ModifyKind};
    use std::fs;

    fn cache_in(dir: &std::path::Path) -> ConfigCache {
        ConfigCache::from_dir(CacheSettings {
            dir: dir.to_path_buf(),
            ttl: Ttl::Disabled,
            ..CacheSettings::default()
        })
    }

    #[test]
    fn test_modify_event_reloads_source() {
        let dir = std::env::temp_dir().join(format!("config-store-watch-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.toml"), "[default]\nname = \"demo\"\n").unwrap();

        let cache = cache_in(&dir);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(dir.join("app.toml"))
            .add_path(dir.join("notes.txt"));

        handle_event(&cache, &event, &tx);

        let reload = rx.try_recv().unwrap();
        assert_eq!(reload.name, "app");
        assert_eq!(reload.outcome, Ok(ReloadOutcome::Refreshed));
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.lookup("app.name").unwrap(), Some(serde_json::json!("demo")));

        fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_access_event_ignored() {
        let cache = cache_in(std::path::Path::new("does-not-exist"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path("x.toml".into());

        handle_event(&cache, &event, &tx);
        assert!(rx.try_recv().is_err());
    }
}
