//! XDG-derived directory layout for installed configs, backups, and state.
//!
//! Everything lives under the acm data dir (`~/.local/share/acm`):
//!
//! ```text
//! aces/config/config.ocio   staged ACES configuration (the install target)
//! backups/backup_<ts>/      pre-switch copies of whatever was active
//! state.json                install/backup records
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name the staged bundle is normalized into.
const CONFIG_DIR_NAME: &str = "config";

/// File name of an OCIO configuration inside a bundle.
pub const CONFIG_FILE_NAME: &str = "config.ocio";

/// Resolved directory layout. Constructed once from XDG dirs (or a root
/// override in tests) and passed around by reference.
#[derive(Debug, Clone)]
pub struct AcmPaths {
    data_dir: PathBuf,
}

impl AcmPaths {
    /// Layout under the XDG data home (`~/.local/share/acm`).
    pub fn from_xdg() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("acm")?;
        Ok(Self {
            data_dir: xdg_dirs.get_data_home(),
        })
    }

    /// Layout rooted at an arbitrary directory (tests, portable installs).
    pub fn at_root(root: &Path) -> Self {
        Self {
            data_dir: root.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory the ACES bundle is installed into.
    pub fn aces_dir(&self) -> PathBuf {
        self.data_dir.join("aces")
    }

    /// Normalized location of the staged config directory.
    pub fn staged_config_dir(&self) -> PathBuf {
        self.aces_dir().join(CONFIG_DIR_NAME)
    }

    /// Path the active pointer is set to when ACES is in effect.
    pub fn installed_config_path(&self) -> PathBuf {
        self.staged_config_dir().join(CONFIG_FILE_NAME)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// True when a staged config file exists at the expected location.
    pub fn is_installed(&self) -> bool {
        self.installed_config_path().is_file()
    }

    /// Create the data, install, and backup directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.data_dir.clone(), self.aces_dir(), self.backups_dir()] {
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_under_root() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(tmp.path());
        assert_eq!(paths.aces_dir(), tmp.path().join("aces"));
        assert_eq!(
            paths.installed_config_path(),
            tmp.path().join("aces").join("config").join("config.ocio")
        );
        assert_eq!(paths.state_file(), tmp.path().join("state.json"));
    }

    #[test]
    fn ensure_dirs_creates_layout_and_is_idempotent() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("nested"));
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.aces_dir().is_dir());
        assert!(paths.backups_dir().is_dir());
        assert!(!paths.is_installed());
    }
}
