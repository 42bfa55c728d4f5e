//! The capability seam between the walker and concrete scan sources.
//!
//! A [`ScanSource`] lists one container's direct children; the
//! [`TreeWalker`](crate::walker::TreeWalker) drives the recursion. Two
//! realizations ship with the crate, the local filesystem
//! ([`source_fs`](crate::source_fs)) and a paginated remote listing API
//! ([`source_remote`](crate::source_remote)); tests substitute in-memory
//! fakes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::{Config, SourceKind};
use crate::error::ScanError;
use crate::source_fs::LocalSource;
use crate::source_remote::RemoteSource;

/// Container (folder) or leaf (file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Container,
    Leaf,
}

/// One direct child of a listed container.
///
/// Leaves have already passed the extension allow-list; containers are
/// always emitted regardless of content.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub kind: EntryKind,
    pub name: String,
    /// Opaque handle for listing this entry's own children (filesystem path
    /// or remote folder id). Meaningful for containers.
    pub locator: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// Relative path (local) or view link (remote).
    pub external_reference: String,
    /// First-MiB digest for local leaves; `None` for remote sources.
    pub content_signature: Option<String>,
}

/// A scan source lists the direct children of one container per call.
///
/// Implementations filter leaves by the extension allow-list before
/// emitting them and must not fail on individual unreadable entries;
/// those are skipped and logged.
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Short label for log lines (`"local"`, `"remote"`).
    fn kind(&self) -> &str;

    /// List the direct children of `locator`, non-recursively.
    ///
    /// A missing or unreachable container is a
    /// [`ScanError::SourceUnavailable`]; the caller decides whether that
    /// empties the whole walk (root) or just skips a subtree.
    async fn list_children(&self, locator: &str) -> Result<Vec<SourceEntry>, ScanError>;
}

/// Lowercase extension without the dot, or `None` when the name has no
/// usable extension.
pub fn leaf_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Build the configured source realization.
///
/// Remote construction reads the API credential from the environment and
/// fails fast when it is missing, treating that as a startup
/// configuration error.
pub fn from_config(config: &Config) -> Result<Arc<dyn ScanSource>> {
    match config.scan.source {
        SourceKind::Local => {
            let root = config
                .scan
                .local_root
                .as_ref()
                .expect("validated by load_config");
            Ok(Arc::new(LocalSource::new(root, &config.scan.extensions)))
        }
        SourceKind::Remote => {
            let remote = config.remote.as_ref().expect("validated by load_config");
            Ok(Arc::new(RemoteSource::new(remote, &config.scan.extensions)?))
        }
    }
}
