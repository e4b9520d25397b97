//! Persistent manager state (`state.json` under the data dir).
//!
//! Records the current install and every backup taken. Loading tolerates a
//! missing or corrupt file by falling back to the empty state; the state is
//! bookkeeping, never a prerequisite.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a backup was taken of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// The configuration that was active before a switch.
    Active,
    /// The host's shipped default configuration (backed up at most once).
    Default,
}

/// One backup: source directory, destination, and when it was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Timestamp in `YYYYmmdd-HHMMSS` form, also embedded in the dir name.
    pub time: String,
    pub src_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub kind: BackupKind,
}

/// Details of the currently installed bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    /// URL the bundle was fetched from.
    pub source_url: String,
    /// Unix time of installation.
    pub installed_at: i64,
    /// SHA-256 of the staged `config.ocio`, lowercase hex.
    pub config_sha256: String,
}

/// Cached result of the last release probe (see `release`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub latest_tag: String,
    pub asset_url: Option<String>,
    pub html_url: Option<String>,
    pub checked_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerState {
    #[serde(default)]
    pub install: Option<InstallRecord>,
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
    #[serde(default)]
    pub update: Option<UpdateCheck>,
}

impl ManagerState {
    /// Load state from `path`. Missing file: empty state. Corrupt file:
    /// empty state with a warning, matching how losing bookkeeping should
    /// never block an install or switch.
    pub fn load(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("could not read state {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("ignoring corrupt state {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save state as pretty JSON, creating parent dirs as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize state")?;
        std::fs::write(path, json).with_context(|| format!("write state: {}", path.display()))?;
        Ok(())
    }

    /// True when the shipped default config has already been backed up.
    pub fn has_default_backup(&self) -> bool {
        self.backups.iter().any(|b| b.kind == BackupKind::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_state_loads_empty() {
        let tmp = tempdir().unwrap();
        let state = ManagerState::load(&tmp.path().join("state.json"));
        assert!(state.install.is_none());
        assert!(state.backups.is_empty());
    }

    #[test]
    fn corrupt_state_loads_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let state = ManagerState::load(&path);
        assert!(state.install.is_none());
    }

    #[test]
    fn save_load_roundtrip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sub").join("state.json");
        let mut state = ManagerState::default();
        state.install = Some(InstallRecord {
            source_url: "https://example.com/aces.zip".into(),
            installed_at: 1_700_000_000,
            config_sha256: "ab".repeat(32),
        });
        state.backups.push(BackupRecord {
            time: "20260830-120000".into(),
            src_dir: PathBuf::from("/prev"),
            backup_dir: PathBuf::from("/backups/backup_20260830-120000"),
            kind: BackupKind::Active,
        });
        state.save(&path).unwrap();

        let loaded = ManagerState::load(&path);
        assert_eq!(
            loaded.install.as_ref().unwrap().source_url,
            "https://example.com/aces.zip"
        );
        assert_eq!(loaded.backups.len(), 1);
        assert_eq!(loaded.backups[0].kind, BackupKind::Active);
        assert!(!loaded.has_default_backup());
    }

    #[test]
    fn has_default_backup_detects_kind() {
        let mut state = ManagerState::default();
        state.backups.push(BackupRecord {
            time: "20260830-120000".into(),
            src_dir: PathBuf::from("/host/colormanagement"),
            backup_dir: PathBuf::from("/backups/default_backup_20260830-120000"),
            kind: BackupKind::Default,
        });
        assert!(state.has_default_backup());
    }
}
