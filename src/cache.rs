//! On-disk JSON cache of the last completed scan.
//!
//! The cache is the only thing API readers see; they never wait on an
//! in-progress scan. Writes go to a temporary sibling path and are renamed
//! over the final path, so a concurrent reader never observes a
//! half-written document.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ScanError;
use crate::models::ScanResult;

pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the cache with `result`.
    pub fn write(&self, result: &ScanResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(result)?;
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write cache file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace cache file: {}", self.path.display()))?;
        Ok(())
    }

    /// Read the last scan. A missing file is `Ok(None)`; a corrupt file is
    /// logged and also reads as `Ok(None)` so callers can fall back to an
    /// on-demand scan. Only genuine IO failures propagate.
    pub fn read(&self) -> Result<Option<ScanResult>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read cache file: {}", self.path.display())
                })
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(result) => Ok(Some(result)),
            Err(err) => {
                let corrupt = ScanError::CacheCorrupt {
                    path: self.path.display().to_string(),
                    reason: err.to_string(),
                };
                warn!(%corrupt, "treating cache as absent");
                Ok(None)
            }
        }
    }
}
