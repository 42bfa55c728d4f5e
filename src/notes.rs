//! Persistent free-text annotations keyed by `(discipline, filename)`.
//!
//! Stored as a flat JSON object `"<discipline>_<filename>": "note text"`.
//! Loaded once at startup and held in memory; saved on every mutation and
//! again after each scan. Stale keys for deleted files are kept; they are
//! harmless and the note survives if the file comes back.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct NoteStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl NoteStore {
    /// Load notes from disk. A missing file yields an empty store; a corrupt
    /// file is logged and yields an empty store rather than failing startup.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read(path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), %err, "notes file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read notes file, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    fn key(discipline: &str, filename: &str) -> String {
        format!("{discipline}_{filename}")
    }

    pub fn get(&self, discipline: &str, filename: &str) -> Option<&str> {
        self.entries
            .get(&Self::key(discipline, filename))
            .map(String::as_str)
    }

    /// Set or clear a note. Empty (after trimming) content removes the entry,
    /// matching the notes API contract.
    pub fn set(&mut self, discipline: &str, filename: &str, content: &str) {
        let key = Self::key(discipline, filename);
        if content.trim().is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, content.to_string());
        }
    }

    pub fn remove(&mut self, discipline: &str, filename: &str) {
        self.entries.remove(&Self::key(discipline, filename));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the current entries. The scan loop calls this after every
    /// scan even when nothing changed; the API layer calls it on mutation.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write notes file: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = NoteStore::load(&tmp.path().join("none.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = NoteStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn set_save_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.json");

        let mut store = NoteStore::load(&path);
        store.set("structure", "laje.dwg", "revisar ferragem");
        store.save().unwrap();

        let reloaded = NoteStore::load(&path);
        assert_eq!(reloaded.get("structure", "laje.dwg"), Some("revisar ferragem"));
        assert_eq!(reloaded.get("structure", "outra.dwg"), None);
    }

    #[test]
    fn empty_content_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = NoteStore::load(&tmp.path().join("notes.json"));
        store.set("structure", "laje.dwg", "nota");
        store.set("structure", "laje.dwg", "   ");
        assert!(store.get("structure", "laje.dwg").is_none());
        assert!(store.is_empty());
    }
}
