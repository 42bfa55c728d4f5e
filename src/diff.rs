//! Change detection between two scans.

use std::collections::{HashMap, HashSet};

use crate::models::{ChangeSet, FileRecord, ScanResult};

/// Diff two scans by file identity (name within discipline) and content
/// signature.
///
/// Signature comparison: two absent signatures compare as unchanged (no
/// evidence of modification, the normal case for remote sources, which
/// never carry one); an absent signature against a present one counts as
/// modified. Local signatures cover only the first MiB, so this is a change
/// heuristic; do not base integrity decisions on the resulting ChangeSet.
///
/// A `None` previous scan (first-ever run) yields an empty ChangeSet, never
/// "everything added". Disciplines missing from `current` entirely are not
/// reported.
pub fn diff_scans(previous: Option<&ScanResult>, current: &ScanResult) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let Some(previous) = previous else {
        return changes;
    };

    for (key, bucket) in &current.buckets {
        let previous_files: HashMap<&str, &FileRecord> = previous
            .buckets
            .get(key)
            .map(|b| b.files.iter().map(|f| (f.name.as_str(), f)).collect())
            .unwrap_or_default();

        let mut seen: HashSet<&str> = HashSet::new();
        for file in &bucket.files {
            seen.insert(file.name.as_str());
            match previous_files.get(file.name.as_str()) {
                None => changes.added.push((key.clone(), file.name.clone())),
                Some(prev) => {
                    if prev.content_signature != file.content_signature {
                        changes.modified.push((key.clone(), file.name.clone()));
                    }
                }
            }
        }

        for name in previous_files.keys() {
            if !seen.contains(name) {
                changes.removed.push((key.clone(), name.to_string()));
            }
        }
    }

    changes.added.sort();
    changes.modified.sort();
    changes.removed.sort();
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisciplineBucket;
    use crate::size::format_size;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(name: &str, signature: Option<&str>) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            extension: "dwg".to_string(),
            size_bytes: 10,
            size_human: format_size(10),
            modified_at: Utc::now(),
            relative_path: vec![],
            external_reference: name.to_string(),
            content_signature: signature.map(str::to_string),
            annotation: None,
        }
    }

    fn scan(buckets: &[(&str, Vec<FileRecord>)]) -> ScanResult {
        let mut map = BTreeMap::new();
        for (key, files) in buckets {
            let mut bucket = DisciplineBucket::empty(key, key);
            for file in files.clone() {
                bucket.push(file);
            }
            map.insert(key.to_string(), bucket);
        }
        ScanResult {
            timestamp: Utc::now(),
            buckets: map,
        }
    }

    #[test]
    fn identical_scans_diff_empty() {
        let r = scan(&[("structure", vec![record("laje.dwg", Some("abc123"))])]);
        assert!(diff_scans(Some(&r), &r).is_empty());
    }

    #[test]
    fn first_scan_without_baseline_reports_nothing() {
        let r = scan(&[("structure", vec![record("laje.dwg", Some("abc123"))])]);
        assert!(diff_scans(None, &r).is_empty());
    }

    #[test]
    fn signature_change_is_modified_only() {
        let before = scan(&[("structure", vec![record("laje.dwg", Some("abc123"))])]);
        let after = scan(&[("structure", vec![record("laje.dwg", Some("def456"))])]);

        let changes = diff_scans(Some(&before), &after);
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
        assert_eq!(
            changes.modified,
            vec![("structure".to_string(), "laje.dwg".to_string())]
        );
    }

    #[test]
    fn added_and_removed_are_reported() {
        let before = scan(&[("structure", vec![record("antiga.dwg", None)])]);
        let after = scan(&[("structure", vec![record("nova.dwg", None)])]);

        let changes = diff_scans(Some(&before), &after);
        assert_eq!(
            changes.added,
            vec![("structure".to_string(), "nova.dwg".to_string())]
        );
        assert_eq!(
            changes.removed,
            vec![("structure".to_string(), "antiga.dwg".to_string())]
        );
        assert!(changes.modified.is_empty());
    }

    #[test]
    fn absent_signatures_on_both_sides_are_unchanged() {
        let before = scan(&[("structure", vec![record("remota.pdf", None)])]);
        let after = scan(&[("structure", vec![record("remota.pdf", None)])]);
        assert!(diff_scans(Some(&before), &after).is_empty());
    }

    #[test]
    fn signature_appearing_counts_as_modified() {
        let before = scan(&[("structure", vec![record("laje.dwg", None)])]);
        let after = scan(&[("structure", vec![record("laje.dwg", Some("abc"))])]);
        let changes = diff_scans(Some(&before), &after);
        assert_eq!(changes.modified.len(), 1);
    }

    #[test]
    fn discipline_absent_from_previous_is_all_added() {
        let before = scan(&[("structure", vec![])]);
        let after = scan(&[
            ("structure", vec![]),
            ("hydraulic", vec![record("rede.dwg", Some("x"))]),
        ]);
        let changes = diff_scans(Some(&before), &after);
        assert_eq!(
            changes.added,
            vec![("hydraulic".to_string(), "rede.dwg".to_string())]
        );
    }
}
