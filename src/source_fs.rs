//! Local filesystem scan source.
//!
//! Lists one directory per call; the walker drives the recursion. Leaf
//! metadata comes from `std::fs`. Content signatures hash at most the
//! first MiB of each qualifying file, a bounded-cost change heuristic
//! rather than a full-file integrity digest.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ScanError;
use crate::source::{leaf_extension, EntryKind, ScanSource, SourceEntry};

const SIGNATURE_READ_LIMIT: u64 = 1024 * 1024;

pub struct LocalSource {
    /// Base directory external references are expressed relative to.
    base: PathBuf,
    extensions: Vec<String>,
}

impl LocalSource {
    pub fn new(base: &Path, extensions: &[String]) -> Self {
        Self {
            base: base.to_path_buf(),
            extensions: extensions.to_vec(),
        }
    }

    /// Relative path from the base, with forward slashes on every platform.
    fn external_reference(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl ScanSource for LocalSource {
    fn kind(&self) -> &str {
        "local"
    }

    async fn list_children(&self, locator: &str) -> Result<Vec<SourceEntry>, ScanError> {
        let dir = Path::new(locator);
        let read_dir = std::fs::read_dir(dir).map_err(|err| ScanError::SourceUnavailable {
            locator: locator.to_string(),
            reason: err.to_string(),
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(%err, dir = locator, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = dir_entry.path();
            let name = dir_entry.file_name().to_string_lossy().to_string();

            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warn!(%err, entry = %name, "skipping entry without metadata");
                    continue;
                }
            };

            if metadata.is_dir() {
                entries.push(SourceEntry {
                    kind: EntryKind::Container,
                    locator: path.to_string_lossy().to_string(),
                    external_reference: self.external_reference(&path),
                    name,
                    size_bytes: 0,
                    modified_at: Utc::now(),
                    content_signature: None,
                });
                continue;
            }
            if !metadata.is_file() {
                continue;
            }

            let Some(ext) = leaf_extension(&name) else {
                continue;
            };
            if !self.extensions.contains(&ext) {
                continue;
            }

            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);

            entries.push(SourceEntry {
                kind: EntryKind::Leaf,
                locator: path.to_string_lossy().to_string(),
                external_reference: self.external_reference(&path),
                size_bytes: metadata.len(),
                modified_at,
                content_signature: first_mib_signature(&path),
                name,
            });
        }

        // Deterministic ordering for stable cache output and diffs.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Hex SHA-256 over at most the first MiB of the file. `None` when the file
/// cannot be read; the record is still emitted without a signature.
fn first_mib_signature(path: &Path) -> Option<String> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(err) => {
            warn!(%err, path = %path.display(), "could not open file for signature");
            return None;
        }
    };
    let mut data = Vec::new();
    if let Err(err) = file.take(SIGNATURE_READ_LIMIT).read_to_end(&mut data) {
        warn!(%err, path = %path.display(), "could not read file for signature");
        return None;
    }
    Some(hex::encode(Sha256::digest(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tmp: &tempfile::TempDir) -> LocalSource {
        LocalSource::new(tmp.path(), &["dwg".to_string(), "pdf".to_string()])
    }

    #[tokio::test]
    async fn lists_containers_and_allowed_leaves() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("Detalhes")).unwrap();
        std::fs::write(tmp.path().join("planta.pdf"), b"pdf bytes").unwrap();
        std::fs::write(tmp.path().join("notas.txt"), b"ignored").unwrap();

        let entries = source(&tmp)
            .list_children(tmp.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Detalhes");
        assert_eq!(entries[0].kind, EntryKind::Container);
        assert_eq!(entries[1].name, "planta.pdf");
        assert_eq!(entries[1].kind, EntryKind::Leaf);
        assert_eq!(entries[1].size_bytes, 9);
        assert!(entries[1].content_signature.is_some());
        assert_eq!(entries[1].external_reference, "planta.pdf");
    }

    #[tokio::test]
    async fn missing_directory_is_source_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let err = source(&tmp)
            .list_children(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn signature_changes_with_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("laje.dwg");

        std::fs::write(&path, b"rev A").unwrap();
        let first = first_mib_signature(&path).unwrap();

        std::fs::write(&path, b"rev B").unwrap();
        let second = first_mib_signature(&path).unwrap();

        assert_ne!(first, second);
    }
}
