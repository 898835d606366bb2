//! End-to-end tests against TOML/JSON sources on disk.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use config_store::config::schema::CacheConfig;
use config_store::store::{ConfigCache, ReloadOutcome, Ttl};
use serde_json::json;

mod common;

use common::{scratch_dir, CollectingLogger};

/// Rewrite a file and push its mtime forward so the change is always visible.
fn rewrite(path: &Path, content: &str, bump_secs: u64) {
    fs::write(path, content).unwrap();
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(bump_secs))
        .unwrap();
}

fn cache_for(dir: &Path, environment: &str) -> ConfigCache {
    let config = CacheConfig {
        dir: dir.to_string_lossy().into_owned(),
        environment: environment.to_string(),
        ..CacheConfig::default()
    };
    let mut settings = config.settings();
    settings.ttl = Ttl::Window(Duration::ZERO);
    ConfigCache::from_dir(settings)
}

#[test]
fn test_bulk_load_survives_broken_sibling() {
    let dir = scratch_dir("bulk");
    fs::write(
        dir.join("database.toml"),
        "[default]\nhost = \"localhost\"\nport = 5432\n\n[production]\nhost = \"db.internal\"\n",
    )
    .unwrap();
    fs::write(dir.join("features.json"), r#"{"default": {"beta": false}, "production": {"beta": true}}"#).unwrap();
    fs::write(dir.join("broken.toml"), "[default\n").unwrap();

    let logger = CollectingLogger::new();
    let cache = cache_for(&dir, "production").with_logger(logger.clone());
    let report = cache.load_all().unwrap();

    assert_eq!(report.outcome("database"), Some(ReloadOutcome::Refreshed));
    assert_eq!(report.outcome("features"), Some(ReloadOutcome::Refreshed));
    assert_eq!(report.outcome("broken"), Some(ReloadOutcome::Failed));
    assert_eq!(logger.messages().len(), 1);

    assert_eq!(cache.lookup("database.host").unwrap(), Some(json!("db.internal")));
    assert_eq!(cache.lookup("database.port").unwrap(), Some(json!(5432)));
    assert_eq!(cache.lookup("features.beta").unwrap(), Some(json!(true)));
    assert_eq!(cache.lookup("broken.anything").unwrap(), None);

    fs::remove_dir_all(&dir).unwrap_or_default();
}

#[test]
fn test_modified_file_is_reparsed() {
    let dir = scratch_dir("modified");
    let path = dir.join("app.toml");
    rewrite(&path, "[default]\nworkers = 4\n", 0);

    let logger = CollectingLogger::new();
    let cache = cache_for(&dir, "development").with_logger(logger.clone());
    assert_eq!(cache.lookup("app.workers").unwrap(), Some(json!(4)));

    // Same mtime: stale by TTL but only touched.
    assert_eq!(cache.reload("app").unwrap(), ReloadOutcome::Unchanged);

    rewrite(&path, "[default]\nworkers = 8\n", 10);
    assert_eq!(cache.lookup("app.workers").unwrap(), Some(json!(8)));

    // A broken edit keeps the last good value.
    rewrite(&path, "[default]\nworkers = \n", 20);
    assert_eq!(cache.lookup("app.workers").unwrap(), Some(json!(8)));
    assert_eq!(logger.messages().len(), 1);

    fs::remove_dir_all(&dir).unwrap_or_default();
}

#[test]
fn test_missing_directory_yields_empty_report() {
    let dir = scratch_dir("missing").join("nope");
    let logger = CollectingLogger::new();
    let cache = cache_for(&dir, "development").with_logger(logger.clone());

    let report = cache.load_all().unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(logger.messages().len(), 1);
    assert!(!cache.has("anything"));
}
