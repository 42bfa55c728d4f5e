//! Core data models shared by the scanner, cache, and HTTP layer.
//!
//! Serialized field names follow the cache file schema consumed by the
//! frontend: `last_scan`, `disciplines`, and per-bucket `name` / `path` /
//! `files` / `folders` / `total_files` / `total_size` / `total_size_bytes`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::size::format_size;

/// Immutable snapshot of one discovered file.
///
/// Records are constructed only for files whose extension passed the
/// configured allow-list; a re-scan produces new records, never in-place
/// edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// Lowercase extension without the leading dot (e.g. `"dwg"`).
    pub extension: String,
    pub size_bytes: u64,
    pub size_human: String,
    /// Source-provided modification time.
    pub modified_at: DateTime<Utc>,
    /// Path segments from the walk root down to the containing folder,
    /// excluding the filename itself.
    pub relative_path: Vec<String>,
    /// Local relative path (forward slashes) or remote view link.
    pub external_reference: String,
    /// First-MiB digest for local files; `None` when the source cannot
    /// provide one. A change heuristic, not an integrity guarantee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_signature: Option<String>,
    /// Free-text note attached via the notes API, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// One discipline's slice of a scan: its files, folder names, and totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisciplineBucket {
    #[serde(rename = "name")]
    pub display_name: String,
    /// The locator this bucket was scanned from (subdirectory, folder id,
    /// or the shared root in classified mode).
    pub path: String,
    pub files: Vec<FileRecord>,
    #[serde(rename = "folders")]
    pub folder_names: BTreeSet<String>,
    #[serde(rename = "total_files")]
    pub total_file_count: usize,
    #[serde(rename = "total_size")]
    pub total_size_human: String,
    pub total_size_bytes: u64,
}

impl DisciplineBucket {
    /// An empty bucket with zero counts. Used both as the accumulator seed
    /// and as the surfaced result for a discipline whose walk failed.
    pub fn empty(display_name: &str, path: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            path: path.to_string(),
            files: Vec::new(),
            folder_names: BTreeSet::new(),
            total_file_count: 0,
            total_size_human: format_size(0),
            total_size_bytes: 0,
        }
    }

    /// Append a record and keep the totals consistent.
    pub fn push(&mut self, record: FileRecord) {
        self.total_file_count += 1;
        self.total_size_bytes += record.size_bytes;
        self.total_size_human = format_size(self.total_size_bytes);
        self.files.push(record);
    }
}

/// A complete scan: one bucket per configured discipline.
///
/// A discipline whose walk failed is present as an empty bucket, never
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(rename = "last_scan")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "disciplines")]
    pub buckets: BTreeMap<String, DisciplineBucket>,
}

/// Differences between two scans, as `(discipline_key, filename)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<(String, String)>,
    pub modified: Vec<(String, String)>,
    pub removed: Vec<(String, String)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            extension: "pdf".to_string(),
            size_bytes: size,
            size_human: format_size(size),
            modified_at: Utc::now(),
            relative_path: vec![],
            external_reference: name.to_string(),
            content_signature: None,
            annotation: None,
        }
    }

    #[test]
    fn bucket_totals_track_pushes() {
        let mut bucket = DisciplineBucket::empty("ESTRUTURA", "ESTRUTURA");
        assert_eq!(bucket.total_size_human, "0.0B");

        bucket.push(record("a.pdf", 1024));
        bucket.push(record("b.pdf", 512));

        assert_eq!(bucket.total_file_count, 2);
        assert_eq!(bucket.total_size_bytes, 1536);
        assert_eq!(bucket.total_size_human, "1.5KB");
    }

    #[test]
    fn cache_schema_field_names() {
        let mut buckets = BTreeMap::new();
        let mut bucket = DisciplineBucket::empty("ARQUITETURA", "ARQUITETURA");
        bucket.push(record("planta.pdf", 100));
        buckets.insert("architecture".to_string(), bucket);

        let result = ScanResult {
            timestamp: Utc::now(),
            buckets,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("last_scan").is_some());
        let disc = &json["disciplines"]["architecture"];
        assert_eq!(disc["name"], "ARQUITETURA");
        assert_eq!(disc["total_files"], 1);
        assert_eq!(disc["total_size"], "100.0B");
        assert_eq!(disc["total_size_bytes"], 100);
        assert!(disc["files"][0].get("content_signature").is_none());
    }
}
