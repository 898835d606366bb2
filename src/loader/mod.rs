//! Source loading.
//!
//! # Data Flow
//! ```text
//! name
//!     → resolve() (locate the source, e.g. config/<name>.toml)
//!     → freshness() (signature, e.g. modification time)
//!     → parse() (nested default/environment sections)
//! ```
//!
//! # Design Decisions
//! - The cache only sees the `Loader` trait; files are one implementation
//! - Parsed documents are `serde_json::Value` regardless of source format

pub mod file;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;
use thiserror::Error;

pub use file::FileLoader;

/// Where a named source lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation(PathBuf);

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Opaque freshness marker; equal signatures mean the source is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(SystemTime);

impl From<SystemTime> for Signature {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

/// Errors raised while reading or parsing a source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {location}: {source}")]
    Io {
        location: SourceLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {location}: {source}")]
    Toml {
        location: SourceLocation,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid JSON in {location}: {source}")]
    Json {
        location: SourceLocation,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported source format: {0}")]
    UnsupportedFormat(SourceLocation),

    /// Parsed but unusable, or rejected by a custom loader.
    #[error("invalid source {location}: {message}")]
    Invalid {
        location: SourceLocation,
        message: String,
    },
}

/// Contract the cache consumes to find, fingerprint and parse sources.
pub trait Loader: Send + Sync {
    /// Names of every source under `dir`, sorted.
    fn list_sources(&self, dir: &Path) -> Result<Vec<String>, LoadError>;

    /// Locate the source for `name`, if one exists.
    fn resolve(&self, name: &str) -> Option<SourceLocation>;

    fn freshness(&self, location: &SourceLocation) -> Result<Signature, LoadError>;

    /// Parse the raw source into a document of `default`/environment sections.
    fn parse(&self, location: &SourceLocation) -> Result<Value, LoadError>;
}

impl<L: Loader + ?Sized> Loader for std::sync::Arc<L> {
    fn list_sources(&self, dir: &Path) -> Result<Vec<String>, LoadError> {
        (**self).list_sources(dir)
    }

    fn resolve(&self, name: &str) -> Option<SourceLocation> {
        (**self).resolve(name)
    }

    fn freshness(&self, location: &SourceLocation) -> Result<Signature, LoadError> {
        (**self).freshness(location)
    }

    fn parse(&self, location: &SourceLocation) -> Result<Value, LoadError> {
        (**self).parse(location)
    }
}
