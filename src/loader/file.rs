//! Filesystem loader for TOML and JSON sources.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::loader::{LoadError, Loader, Signature, SourceLocation};

/// Extensions tried by `resolve`, in priority order.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Loads `<root>/<name>.toml` or `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source name for `path` if it has a supported extension.
    pub fn source_name(path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        if !SUPPORTED_EXTENSIONS.contains(&ext) {
            return None;
        }
        path.file_stem()?.to_str().map(str::to_string)
    }
}

impl Loader for FileLoader {
    fn list_sources(&self, dir: &Path) -> Result<Vec<String>, LoadError> {
        let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
            location: SourceLocation::new(dir),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| Self::source_name(&path))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn resolve(&self, name: &str) -> Option<SourceLocation> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
            .map(SourceLocation::new)
    }

    fn freshness(&self, location: &SourceLocation) -> Result<Signature, LoadError> {
        fs::metadata(location.path())
            .and_then(|meta| meta.modified())
            .map(Signature::from)
            .map_err(|source| LoadError::Io {
                location: location.clone(),
                source,
            })
    }

    fn parse(&self, location: &SourceLocation) -> Result<Value, LoadError> {
        let content = fs::read_to_string(location.path()).map_err(|source| LoadError::Io {
            location: location.clone(),
            source,
        })?;

        match location.path().extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let doc: toml::Value =
                    toml::from_str(&content).map_err(|source| LoadError::Toml {
                        location: location.clone(),
                        source,
                    })?;
                serde_json::to_value(doc).map_err(|source| LoadError::Json {
                    location: location.clone(),
                    source,
                })
            }
            Some("json") => serde_json::from_str(&content).map_err(|source| LoadError::Json {
                location: location.clone(),
                source,
            }),
            _ => Err(LoadError::UnsupportedFormat(location.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "config-store-file-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_source_name() {
        assert_eq!(FileLoader::source_name(Path::new("a/db.toml")), Some("db".into()));
        assert_eq!(FileLoader::source_name(Path::new("a/db.json")), Some("db".into()));
        assert_eq!(FileLoader::source_name(Path::new("a/db.yml")), None);
        assert_eq!(FileLoader::source_name(Path::new("a/README")), None);
    }

    #[test]
    fn test_list_and_resolve() {
        let dir = scratch_dir("list");
        fs::write(dir.join("db.toml"), "[default]\nhost = \"localhost\"\n").unwrap();
        fs::write(dir.join("app.json"), r#"{"default": {"name": "demo"}}"#).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let loader = FileLoader::new(&dir);
        assert_eq!(loader.list_sources(&dir).unwrap(), vec!["app", "db"]);
        assert_eq!(
            loader.resolve("db").map(|l| l.path().to_path_buf()),
            Some(dir.join("db.toml"))
        );
        assert!(loader.resolve("notes").is_none());

        fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_parse_toml_and_json() {
        let dir = scratch_dir("parse");
        fs::write(dir.join("db.toml"), "[default]\nport = 5432\n").unwrap();
        fs::write(dir.join("app.json"), r#"{"default": {"debug": true}}"#).unwrap();

        let loader = FileLoader::new(&dir);
        let db = loader.parse(&loader.resolve("db").unwrap()).unwrap();
        assert_eq!(db, json!({"default": {"port": 5432}}));
        let app = loader.parse(&loader.resolve("app").unwrap()).unwrap();
        assert_eq!(app, json!({"default": {"debug": true}}));

        fs::remove_dir_all(&dir).unwrap_or_default();
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let dir = scratch_dir("broken");
        fs::write(dir.join("broken.toml"), "[default\nhost = ").unwrap();

        let loader = FileLoader::new(&dir);
        let location = loader.resolve("broken").unwrap();
        assert!(matches!(loader.parse(&location), Err(LoadError::Toml { .. })));
        assert!(loader.freshness(&location).is_ok());

        fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
