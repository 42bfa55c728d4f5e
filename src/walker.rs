//! Recursive tree walk over a [`ScanSource`].
//!
//! The walk uses an explicit worklist instead of call recursion, so stack
//! depth stays bounded on pathological trees. Each pending item carries the
//! path segments from the walk root, which become the `relative_path` of
//! every leaf found beneath it.
//!
//! Folder policy: a container's name is listed in the outcome's `folders`
//! iff it directly or transitively contains at least one allow-listed leaf.
//! The same policy applies to local and remote sources.
//!
//! Failure semantics: an unavailable walk root yields an empty outcome
//! (logged as a warning, not an error); an unavailable subtree is skipped
//! and the walk continues.

use std::collections::{BTreeSet, VecDeque};
use tracing::warn;

use crate::models::FileRecord;
use crate::size::format_size;
use crate::source::{leaf_extension, EntryKind, ScanSource};

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<FileRecord>,
    pub folders: BTreeSet<String>,
    pub total_size_bytes: u64,
}

pub struct TreeWalker<'a> {
    source: &'a dyn ScanSource,
}

impl<'a> TreeWalker<'a> {
    pub fn new(source: &'a dyn ScanSource) -> Self {
        Self { source }
    }

    pub async fn walk(&self, root_locator: &str) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let mut pending: VecDeque<(String, Vec<String>)> = VecDeque::new();
        pending.push_back((root_locator.to_string(), Vec::new()));

        while let Some((locator, segments)) = pending.pop_front() {
            let children = match self.source.list_children(&locator).await {
                Ok(children) => children,
                Err(err) => {
                    if segments.is_empty() {
                        warn!(source = self.source.kind(), %err, "walk root unavailable, returning empty result");
                        return WalkOutcome::default();
                    }
                    warn!(source = self.source.kind(), %err, "skipping unavailable subtree");
                    continue;
                }
            };

            for child in children {
                match child.kind {
                    EntryKind::Container => {
                        let mut child_segments = segments.clone();
                        child_segments.push(child.name);
                        pending.push_back((child.locator, child_segments));
                    }
                    EntryKind::Leaf => {
                        // Every ancestor of a qualifying leaf counts as a
                        // populated folder.
                        for segment in &segments {
                            outcome.folders.insert(segment.clone());
                        }
                        outcome.total_size_bytes += child.size_bytes;
                        outcome.files.push(FileRecord {
                            extension: leaf_extension(&child.name).unwrap_or_default(),
                            name: child.name,
                            size_bytes: child.size_bytes,
                            size_human: format_size(child.size_bytes),
                            modified_at: child.modified_at,
                            relative_path: segments.clone(),
                            external_reference: child.external_reference,
                            content_signature: child.content_signature,
                            annotation: None,
                        });
                    }
                }
            }
        }

        outcome
    }
}
