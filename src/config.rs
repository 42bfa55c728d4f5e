use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_notes_file")]
    pub notes_file: PathBuf,
    pub scan: ScanConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    /// Array of tables; order is significant for the classifier.
    pub disciplines: Vec<DisciplineConfig>,
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("data/file_data.json")
}
fn default_notes_file() -> PathBuf {
    PathBuf::from("data/file_notes.json")
}

/// How buckets are formed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Walk each discipline's own root locator.
    PerDiscipline,
    /// One recursive walk of the shared root, routed by keyword classifier.
    Classified,
}

/// Which `ScanSource` realization to use.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Local,
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_mode")]
    pub mode: ScanMode,
    #[serde(default = "default_source")]
    pub source: SourceKind,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Extension allow-list, without leading dots. Normalized to lowercase
    /// at load time.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Base directory for the local source.
    pub local_root: Option<PathBuf>,
    /// Bucket for files no discipline keyword matches (classified mode).
    #[serde(default = "default_fallback")]
    pub fallback_discipline: String,
}

fn default_mode() -> ScanMode {
    ScanMode::PerDiscipline
}
fn default_source() -> SourceKind {
    SourceKind::Local
}
fn default_interval_secs() -> u64 {
    300
}
fn default_extensions() -> Vec<String> {
    vec!["dwg".to_string(), "pdf".to_string()]
}
fn default_fallback() -> String {
    "others".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base URL of the object-store listing API.
    pub endpoint: String,
    /// Root folder id for classified-mode walks.
    #[serde(default)]
    pub root_folder_id: Option<String>,
    /// Environment variable holding the bearer credential.
    #[serde(default = "default_remote_token_env")]
    pub token_env: String,
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_remote_token_env() -> String {
    "PLANSCAN_REMOTE_TOKEN".to_string()
}
fn default_remote_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Environment variable holding the token-signing secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    #[serde(default = "default_emails_file")]
    pub authorized_emails_file: PathBuf,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_secret_env() -> String {
    "PLANSCAN_TOKEN_SECRET".to_string()
}
fn default_emails_file() -> PathBuf {
    PathBuf::from("config/authorized_emails.json")
}
fn default_token_ttl_days() -> i64 {
    7
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisciplineConfig {
    /// Stable identifier used in cache keys and note keys.
    pub key: String,
    /// Display name shown to API consumers.
    pub name: String,
    /// Subdirectory under `local_root` (per-discipline local scans).
    #[serde(default)]
    pub path: Option<String>,
    /// Remote folder id (per-discipline remote scans).
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Classifier keywords. Empty means the discipline can only be reached
    /// as the fallback.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Config {
    pub fn discipline(&self, key: &str) -> Option<&DisciplineConfig> {
        self.disciplines.iter().find(|d| d.key == key)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.scan.interval_secs == 0 {
        anyhow::bail!("scan.interval_secs must be > 0");
    }

    if config.scan.extensions.is_empty() {
        anyhow::bail!("scan.extensions must list at least one extension");
    }
    for ext in &mut config.scan.extensions {
        *ext = ext.trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            anyhow::bail!("scan.extensions entries must not be empty");
        }
    }

    if config.disciplines.is_empty() {
        anyhow::bail!("at least one [[disciplines]] entry is required");
    }
    for (i, disc) in config.disciplines.iter().enumerate() {
        if disc.key.is_empty() {
            anyhow::bail!("disciplines[{}].key must not be empty", i);
        }
        if config.disciplines[..i].iter().any(|d| d.key == disc.key) {
            anyhow::bail!("duplicate discipline key: '{}'", disc.key);
        }
    }

    if config.scan.source == SourceKind::Remote && config.remote.is_none() {
        anyhow::bail!("scan.source = \"remote\" requires a [remote] section");
    }
    if config.scan.source == SourceKind::Local && config.scan.local_root.is_none() {
        anyhow::bail!("scan.source = \"local\" requires scan.local_root");
    }

    match config.scan.mode {
        ScanMode::PerDiscipline => {
            // Disciplines without a locator are tolerated at runtime (they
            // surface as empty buckets), but a config where none has one is
            // a mistake.
            let has_locator = |d: &DisciplineConfig| match config.scan.source {
                SourceKind::Local => d.path.is_some(),
                SourceKind::Remote => d.folder_id.is_some(),
            };
            if !config.disciplines.iter().any(has_locator) {
                anyhow::bail!(
                    "per-discipline mode requires at least one discipline with a locator \
                     (path for local, folder_id for remote)"
                );
            }
        }
        ScanMode::Classified => {
            if config.discipline(&config.scan.fallback_discipline).is_none() {
                anyhow::bail!(
                    "scan.fallback_discipline '{}' has no matching [[disciplines]] entry",
                    config.scan.fallback_discipline
                );
            }
            if config.scan.source == SourceKind::Remote
                && config
                    .remote
                    .as_ref()
                    .is_some_and(|r| r.root_folder_id.is_none())
            {
                anyhow::bail!("classified remote scans require remote.root_folder_id");
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("planscan.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    const VALID: &str = r#"
[scan]
mode = "per-discipline"
source = "local"
local_root = "/tmp/drive"
extensions = [".DWG", "pdf"]

[server]
bind = "127.0.0.1:8000"

[auth]

[[disciplines]]
key = "architecture"
name = "ARQUITETURA"
path = "ARQUITETURA"
"#;

    #[test]
    fn loads_and_normalizes_extensions() {
        let (_tmp, path) = write_config(VALID);
        let config = load_config(&path).unwrap();
        assert_eq!(config.scan.extensions, vec!["dwg", "pdf"]);
        assert_eq!(config.scan.interval_secs, 300);
        assert_eq!(config.cache_file, PathBuf::from("data/file_data.json"));
    }

    #[test]
    fn rejects_duplicate_discipline_keys() {
        let mut content = VALID.to_string();
        content.push_str("\n[[disciplines]]\nkey = \"architecture\"\nname = \"X\"\npath = \"X\"\n");
        let (_tmp, path) = write_config(&content);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate discipline key"));
    }

    #[test]
    fn classified_mode_requires_fallback_entry() {
        let content = VALID.replace("mode = \"per-discipline\"", "mode = \"classified\"");
        let (_tmp, path) = write_config(&content);
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("fallback_discipline"));
    }

    #[test]
    fn remote_source_requires_remote_section() {
        let content = VALID.replace("source = \"local\"", "source = \"remote\"");
        let (_tmp, path) = write_config(&content);
        assert!(load_config(&path).is_err());
    }
}
