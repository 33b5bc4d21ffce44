use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::committer::{CommitOptions, DEFAULT_BATCH_SIZE};
use crate::db::DB_FILE;
use crate::decoder::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{Result, RosterError};
use crate::listing::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_probe")]
    pub probe_before_commit: bool,
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_probe() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            batch_size: default_batch_size(),
            page_size: default_page_size(),
            max_upload_bytes: default_max_upload_bytes(),
            probe_before_commit: default_probe(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    pub fn commit_options(&self) -> CommitOptions {
        CommitOptions {
            batch_size: self.batch_size,
            probe: self.probe_before_commit,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("roster")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("roster")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| RosterError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.batch_size, 50);
        assert_eq!(s.page_size, 10);
        assert_eq!(s.max_upload_bytes, 5 * 1024 * 1024);
        assert!(s.probe_before_commit);
        assert!(s.data_dir.ends_with("roster"));
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "batch_size": 20}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/test");
        assert_eq!(s.batch_size, 20);
        assert_eq!(s.page_size, 10);
        assert!(s.probe_before_commit);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/srv/roster".into(),
            batch_size: 25,
            page_size: 20,
            max_upload_bytes: 1024,
            probe_before_commit: false,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.page_size, 20);
        assert_eq!(loaded.commit_options(), CommitOptions { batch_size: 25, probe: false });
        assert_eq!(loaded.db_path(), PathBuf::from("/srv/roster/roster.db"));
    }
}
