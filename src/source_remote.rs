//! Remote object-store scan source.
//!
//! Talks to a paginated JSON listing API:
//!
//! ```text
//! GET {endpoint}/list?parent=<folder_id>[&page_token=<token>]
//! Authorization: Bearer <credential>
//!
//! { "entries": [ { "id", "name", "kind", "modified_at", "size",
//!                  "view_link", "trashed" } ],
//!   "next_page_token": "..." }
//! ```
//!
//! The crate depends only on this shape, not on any vendor's client
//! library. Page tokens are followed until exhausted; trashed entries are
//! skipped; folder-typed entries become containers. Remote leaves carry no
//! content signature (the store exposes no content hash), so change
//! detection for remote scans only sees additions and removals.
//!
//! # Credential
//!
//! The bearer credential is read from the environment variable named by
//! `remote.token_env` at construction time. A missing credential is a fatal
//! startup error. Every request carries the timeout from
//! `remote.timeout_secs`; a failed or malformed listing marks the container
//! unavailable rather than crashing the scan loop.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::error::ScanError;
use crate::source::{leaf_extension, EntryKind, ScanSource, SourceEntry};

const PAGE_SIZE: u32 = 1000;

pub struct RemoteSource {
    client: reqwest::Client,
    endpoint: String,
    credential: String,
    extensions: Vec<String>,
}

/// One page of the listing response.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    entries: Vec<RemoteEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The object-store entry shape this crate depends on.
#[derive(Debug, Deserialize)]
struct RemoteEntry {
    id: String,
    name: String,
    /// Type discriminator: `"folder"` for containers, anything else is a leaf.
    kind: String,
    modified_at: DateTime<Utc>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    view_link: Option<String>,
    #[serde(default)]
    trashed: bool,
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig, extensions: &[String]) -> Result<Self> {
        let credential = std::env::var(&config.token_env).with_context(|| {
            format!(
                "{} environment variable not set (remote store credential)",
                config.token_env
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for remote store")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credential,
            extensions: extensions.to_vec(),
        })
    }

    async fn fetch_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, ScanError> {
        let url = format!("{}/list", self.endpoint);
        let mut query: Vec<(&str, String)> = vec![
            ("parent", parent.to_string()),
            ("page_size", PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }

        let unavailable = |reason: String| ScanError::SourceUnavailable {
            locator: parent.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .bearer_auth(&self.credential)
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;

        if !resp.status().is_success() {
            return Err(unavailable(format!("listing returned HTTP {}", resp.status())));
        }

        resp.json::<ListPage>()
            .await
            .map_err(|err| unavailable(format!("malformed listing response: {err}")))
    }
}

#[async_trait::async_trait]
impl ScanSource for RemoteSource {
    fn kind(&self) -> &str {
        "remote"
    }

    async fn list_children(&self, locator: &str) -> Result<Vec<SourceEntry>, ScanError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(locator, page_token.as_deref()).await?;

            for entry in page.entries {
                if entry.trashed {
                    continue;
                }

                if entry.kind == "folder" {
                    entries.push(SourceEntry {
                        kind: EntryKind::Container,
                        locator: entry.id.clone(),
                        external_reference: entry.view_link.unwrap_or_default(),
                        name: entry.name,
                        size_bytes: 0,
                        modified_at: entry.modified_at,
                        content_signature: None,
                    });
                    continue;
                }

                let Some(ext) = leaf_extension(&entry.name) else {
                    continue;
                };
                if !self.extensions.contains(&ext) {
                    continue;
                }

                let external_reference = entry
                    .view_link
                    .unwrap_or_else(|| format!("{}/view/{}", self.endpoint, entry.id));

                entries.push(SourceEntry {
                    kind: EntryKind::Leaf,
                    locator: entry.id,
                    external_reference,
                    name: entry.name,
                    size_bytes: entry.size,
                    modified_at: entry.modified_at,
                    // The listing API exposes no content hash.
                    content_signature: None,
                });
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_page_parses_store_shape() {
        let json = r#"{
            "entries": [
                {"id": "f1", "name": "ESTRUTURA", "kind": "folder",
                 "modified_at": "2026-08-01T12:00:00Z"},
                {"id": "d1", "name": "laje.dwg", "kind": "file",
                 "modified_at": "2026-08-02T08:30:00Z", "size": 2048,
                 "view_link": "https://store.example/view/d1"},
                {"id": "d2", "name": "velho.pdf", "kind": "file",
                 "modified_at": "2026-08-02T08:30:00Z", "trashed": true}
            ],
            "next_page_token": "abc"
        }"#;

        let page: ListPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.entries.len(), 3);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.entries[0].kind, "folder");
        assert_eq!(page.entries[1].size, 2048);
        assert!(page.entries[2].trashed);
    }

    #[test]
    fn final_page_has_no_token() {
        let page: ListPage = serde_json::from_str(r#"{"entries": []}"#).unwrap();
        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
