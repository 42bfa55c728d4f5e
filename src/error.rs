//! Scan error taxonomy.
//!
//! Only configuration errors at startup are fatal (surfaced as `anyhow`
//! failures from [`crate::config::load_config`]). Everything here is
//! recoverable: walks degrade to empty results, corrupt caches read as
//! absent, and individual entries are skipped.

use thiserror::Error;

/// Errors produced while listing or reading scan sources and the cache.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The walk root (or a container) is missing or unreachable.
    /// Yields an empty result for the affected discipline.
    #[error("source unavailable at '{locator}': {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// The cache file exists but does not parse. Treated as cache-absent.
    #[error("cache file '{path}' is corrupt: {reason}")]
    CacheCorrupt { path: String, reason: String },
}
