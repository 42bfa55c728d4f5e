//! Keyword-based discipline classification.

use crate::config::Config;

/// Maps a file's name and path segments to a discipline key.
///
/// Disciplines are tried in configuration order; the first whose keyword
/// list contains a substring of the lowercased `name + path` haystack wins.
/// The fallback discipline is skipped during matching and returned when
/// nothing matches, so a discipline with no keywords is only reachable as
/// the fallback.
pub struct Classifier {
    /// `(key, lowercased keywords)` in configuration order, fallback excluded.
    disciplines: Vec<(String, Vec<String>)>,
    fallback: String,
}

impl Classifier {
    pub fn from_config(config: &Config) -> Self {
        let fallback = config.scan.fallback_discipline.clone();
        let disciplines = config
            .disciplines
            .iter()
            .filter(|d| d.key != fallback)
            .map(|d| {
                let keywords = d.keywords.iter().map(|k| k.to_lowercase()).collect();
                (d.key.clone(), keywords)
            })
            .collect();
        Self {
            disciplines,
            fallback,
        }
    }

    /// Pure function of the inputs and the static keyword configuration.
    pub fn classify(&self, filename: &str, path_segments: &[String]) -> &str {
        let haystack = format!("{} {}", filename, path_segments.join("/")).to_lowercase();

        for (key, keywords) in &self.disciplines {
            if keywords.iter().any(|k| haystack.contains(k.as_str())) {
                return key;
            }
        }
        &self.fallback
    }
}
