//! Scan orchestration.
//!
//! `run_once` drives the tree walker across every configured discipline
//! (per-discipline mode) or routes a single recursive walk through the
//! keyword classifier (classified mode), merges stored notes into the
//! records, and assembles the [`ScanResult`]. `run_and_store` is the scan
//! loop's driver: it additionally diffs against the previous cache and
//! replaces it atomically.

use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::classify::Classifier;
use crate::config::{Config, DisciplineConfig, ScanMode, SourceKind};
use crate::diff::diff_scans;
use crate::models::{ChangeSet, DisciplineBucket, ScanResult};
use crate::notes::NoteStore;
use crate::source::ScanSource;
use crate::walker::{TreeWalker, WalkOutcome};

pub struct ScanOrchestrator {
    config: Arc<Config>,
    source: Arc<dyn ScanSource>,
    notes: Arc<Mutex<NoteStore>>,
    classifier: Classifier,
}

impl ScanOrchestrator {
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn ScanSource>,
        notes: Arc<Mutex<NoteStore>>,
    ) -> Self {
        let classifier = Classifier::from_config(&config);
        Self {
            config,
            source,
            notes,
            classifier,
        }
    }

    /// Run one complete scan and return the assembled result.
    ///
    /// A discipline whose walk fails surfaces as an empty bucket; the other
    /// disciplines still succeed. Notes are persisted afterwards (content
    /// untouched) and the timestamp is the scan start time. Idempotent.
    pub async fn run_once(&self) -> ScanResult {
        let started = Utc::now();
        info!(source = self.source.kind(), "starting scan");

        let buckets = match self.config.scan.mode {
            ScanMode::PerDiscipline => self.scan_per_discipline().await,
            ScanMode::Classified => self.scan_classified().await,
        };

        for (key, bucket) in &buckets {
            info!(
                discipline = key.as_str(),
                files = bucket.total_file_count,
                size = bucket.total_size_human.as_str(),
                "discipline scanned"
            );
        }

        {
            let notes = self.notes.lock().expect("note store lock poisoned");
            if let Err(err) = notes.save() {
                warn!(%err, "failed to persist notes after scan");
            }
        }

        ScanResult {
            timestamp: started,
            buckets,
        }
    }

    /// Walk each discipline's own root locator.
    async fn scan_per_discipline(&self) -> BTreeMap<String, DisciplineBucket> {
        // Walks first, note merging after; the note store lock is never
        // held across an await.
        let mut outcomes: Vec<(&DisciplineConfig, String, Option<WalkOutcome>)> = Vec::new();

        for disc in &self.config.disciplines {
            let Some(locator) = self.discipline_locator(disc) else {
                warn!(
                    discipline = disc.key.as_str(),
                    "no locator configured, leaving bucket empty"
                );
                outcomes.push((disc, String::new(), None));
                continue;
            };

            let walker = TreeWalker::new(self.source.as_ref());
            let outcome = walker.walk(&locator).await;
            outcomes.push((disc, locator, Some(outcome)));
        }

        let notes = self.notes.lock().expect("note store lock poisoned");
        let mut buckets = BTreeMap::new();

        for (disc, locator, outcome) in outcomes {
            let mut bucket = DisciplineBucket::empty(&disc.name, &locator);
            if let Some(outcome) = outcome {
                bucket.folder_names = outcome.folders;
                for mut record in outcome.files {
                    record.annotation = notes
                        .get(&disc.key, &record.name)
                        .map(str::to_string);
                    bucket.push(record);
                }
            }
            buckets.insert(disc.key.clone(), bucket);
        }

        buckets
    }

    /// One recursive walk of the shared root; each file is routed to a
    /// bucket by the keyword classifier, and every ancestor folder of a
    /// routed file is attributed to that file's bucket.
    async fn scan_classified(&self) -> BTreeMap<String, DisciplineBucket> {
        let root = self.classified_root();

        let mut buckets: BTreeMap<String, DisciplineBucket> = self
            .config
            .disciplines
            .iter()
            .map(|d| (d.key.clone(), DisciplineBucket::empty(&d.name, &root)))
            .collect();

        let walker = TreeWalker::new(self.source.as_ref());
        let outcome = walker.walk(&root).await;

        let notes = self.notes.lock().expect("note store lock poisoned");
        for mut record in outcome.files {
            let key = self
                .classifier
                .classify(&record.name, &record.relative_path)
                .to_string();
            record.annotation = notes.get(&key, &record.name).map(str::to_string);

            let bucket = buckets
                .get_mut(&key)
                .expect("classifier only returns configured keys");
            for segment in &record.relative_path {
                bucket.folder_names.insert(segment.clone());
            }
            bucket.push(record);
        }

        buckets
    }

    fn discipline_locator(&self, disc: &DisciplineConfig) -> Option<String> {
        match self.config.scan.source {
            SourceKind::Local => {
                let root = self.config.scan.local_root.as_ref()?;
                let path = disc.path.as_ref()?;
                Some(root.join(path).to_string_lossy().to_string())
            }
            SourceKind::Remote => disc.folder_id.clone(),
        }
    }

    fn classified_root(&self) -> String {
        match self.config.scan.source {
            SourceKind::Local => self
                .config
                .scan
                .local_root
                .as_ref()
                .expect("validated by load_config")
                .to_string_lossy()
                .to_string(),
            SourceKind::Remote => self
                .config
                .remote
                .as_ref()
                .and_then(|r| r.root_folder_id.clone())
                .expect("validated by load_config"),
        }
    }

    /// Scan, diff against the previous cache, and replace it.
    pub async fn run_and_store(&self, cache: &CacheStore) -> Result<ChangeSet> {
        let previous = cache.read()?;
        let result = self.run_once().await;
        let changes = diff_scans(previous.as_ref(), &result);
        cache.write(&result)?;

        if changes.is_empty() {
            info!("scan complete, no changes since previous scan");
        } else {
            info!(
                added = changes.added.len(),
                modified = changes.modified.len(),
                removed = changes.removed.len(),
                "scan complete"
            );
        }
        Ok(changes)
    }
}
