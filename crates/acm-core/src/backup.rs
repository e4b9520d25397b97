//! Pre-switch backups of configuration directories.
//!
//! Whole config directories are copied (a `config.ocio` is useless without
//! its LUTs) into timestamped slots under the backups dir. Nothing prunes
//! or restores automatically; restore is the user pointing the switcher at
//! a backup file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::archive::copy_dir_recursive;
use crate::host::Host;
use crate::paths::{AcmPaths, CONFIG_FILE_NAME};
use crate::state::{BackupKind, BackupRecord, ManagerState};

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Backup slot name for a kind and timestamp.
fn slot_name(kind: BackupKind, ts: &str) -> String {
    match kind {
        BackupKind::Active => format!("backup_{ts}"),
        BackupKind::Default => format!("default_backup_{ts}"),
    }
}

/// Copies `src_dir` into a fresh timestamped slot, records it in `state`,
/// and persists the state file. Returns the backup directory.
pub fn backup_config_dir(
    paths: &AcmPaths,
    state: &mut ManagerState,
    src_dir: &Path,
    kind: BackupKind,
) -> Result<PathBuf> {
    paths.ensure_dirs()?;
    let ts = timestamp();
    let base = slot_name(kind, &ts);

    // Two switches inside one second must still get distinct slots.
    let mut backup_dir = paths.backups_dir().join(&base);
    let mut n = 1;
    while backup_dir.exists() {
        backup_dir = paths.backups_dir().join(format!("{base}-{n}"));
        n += 1;
    }

    copy_dir_recursive(src_dir, &backup_dir).with_context(|| {
        format!(
            "back up {} into {}",
            src_dir.display(),
            backup_dir.display()
        )
    })?;

    state.backups.push(BackupRecord {
        time: ts,
        src_dir: src_dir.to_path_buf(),
        backup_dir: backup_dir.clone(),
        kind,
    });
    state.save(&paths.state_file())?;

    tracing::info!("backed up {} to {}", src_dir.display(), backup_dir.display());
    Ok(backup_dir)
}

/// Backs up the directory holding the currently active config file, when
/// there is one and it still exists on disk.
pub fn backup_active(
    paths: &AcmPaths,
    state: &mut ManagerState,
    active: &Path,
) -> Result<Option<PathBuf>> {
    if !active.is_file() {
        tracing::debug!("active config {} missing, nothing to back up", active.display());
        return Ok(None);
    }
    let Some(src_dir) = active.parent() else {
        return Ok(None);
    };
    backup_config_dir(paths, state, src_dir, BackupKind::Active).map(Some)
}

/// Backs up the host's shipped default config, at most once. Returns the
/// backup dir, or None when a default backup already exists or the shipped
/// config cannot be found.
pub fn backup_default_once(
    paths: &AcmPaths,
    state: &mut ManagerState,
    host: &dyn Host,
) -> Result<Option<PathBuf>> {
    if state.has_default_backup() {
        return Ok(None);
    }
    let Some(dir) = locate_default_config(host.binary_path().as_deref()) else {
        tracing::debug!("could not locate the host's shipped default config");
        return Ok(None);
    };
    backup_config_dir(paths, state, &dir, BackupKind::Default).map(Some)
}

/// Deletes the backups directory and forgets every backup record. Returns
/// how many records were dropped.
pub fn purge_backups(paths: &AcmPaths, state: &mut ManagerState) -> Result<usize> {
    let dir = paths.backups_dir();
    if dir.exists() {
        std::fs::remove_dir_all(&dir).with_context(|| format!("remove {}", dir.display()))?;
    }
    let removed = state.backups.len();
    state.backups.clear();
    state.save(&paths.state_file())?;
    if removed > 0 {
        tracing::info!("purged {} backup(s) from {}", removed, dir.display());
    }
    Ok(removed)
}

/// Searches near the host binary for the shipped default: a directory named
/// `colormanagement` containing a `config.ocio`. Hidden directories are
/// pruned to keep the walk cheap.
pub fn locate_default_config(binary: Option<&Path>) -> Option<PathBuf> {
    let binary = binary?;
    let install_root = binary.parent()?;
    let mut roots = vec![install_root.to_path_buf()];
    if let Some(up) = install_root.parent() {
        roots.push(up.to_path_buf());
    }
    for root in roots {
        if let Some(found) = find_colormanagement_dir(&root) {
            return Some(found);
        }
    }
    None
}

fn find_colormanagement_dir(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if name.eq_ignore_ascii_case("colormanagement")
                && path.join(CONFIG_FILE_NAME).is_file()
            {
                return Some(path);
            }
            subdirs.push(path);
        }
    }
    subdirs.into_iter().find_map(|d| find_colormanagement_dir(&d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PrefsHost;
    use tempfile::tempdir;

    fn config_dir_with(content: &str, root: &Path) -> PathBuf {
        let dir = root.join("active_cfg");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
        dir
    }

    #[test]
    fn backup_copies_directory_and_records_it() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let src = config_dir_with("ocio_profile_version: 2\n", tmp.path());
        std::fs::write(src.join("extra.lut"), b"lut").unwrap();

        let backup = backup_config_dir(&paths, &mut state, &src, BackupKind::Active).unwrap();
        assert!(backup.join(CONFIG_FILE_NAME).is_file());
        assert!(backup.join("extra.lut").is_file());
        assert_eq!(state.backups.len(), 1);
        assert_eq!(state.backups[0].backup_dir, backup);

        // Record survived to disk too.
        let reloaded = ManagerState::load(&paths.state_file());
        assert_eq!(reloaded.backups.len(), 1);
    }

    #[test]
    fn same_second_backups_get_distinct_slots() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let src = config_dir_with("ocio_profile_version: 2\n", tmp.path());

        let first = backup_config_dir(&paths, &mut state, &src, BackupKind::Active).unwrap();
        let second = backup_config_dir(&paths, &mut state, &src, BackupKind::Active).unwrap();
        assert_ne!(first, second);
        assert_eq!(state.backups.len(), 2);
    }

    #[test]
    fn backup_active_skips_missing_file() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let out = backup_active(&paths, &mut state, &tmp.path().join("gone.ocio")).unwrap();
        assert!(out.is_none());
        assert!(state.backups.is_empty());
    }

    #[test]
    fn default_backup_happens_once() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();

        // Fake host install tree: <root>/host/bin/host, <root>/host/datafiles/colormanagement.
        let install = tmp.path().join("host");
        let bin = install.join("bin").join("host");
        std::fs::create_dir_all(bin.parent().unwrap()).unwrap();
        std::fs::write(&bin, b"").unwrap();
        let cm = install.join("datafiles").join("colormanagement");
        std::fs::create_dir_all(&cm).unwrap();
        std::fs::write(cm.join(CONFIG_FILE_NAME), "ocio_profile_version: 2\n").unwrap();

        let host = PrefsHost::new(tmp.path().join("ptr"), Some(bin), false);
        let first = backup_default_once(&paths, &mut state, &host).unwrap();
        assert!(first.is_some());
        let second = backup_default_once(&paths, &mut state, &host).unwrap();
        assert!(second.is_none(), "default must be backed up at most once");
        assert_eq!(state.backups.len(), 1);
    }

    #[test]
    fn purge_removes_backups_and_records() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let src = config_dir_with("ocio_profile_version: 2\n", tmp.path());
        backup_config_dir(&paths, &mut state, &src, BackupKind::Active).unwrap();
        assert!(paths.backups_dir().exists());

        let removed = purge_backups(&paths, &mut state).unwrap();
        assert_eq!(removed, 1);
        assert!(!paths.backups_dir().exists());
        assert!(state.backups.is_empty());
        // Purging again is a harmless no-op.
        assert_eq!(purge_backups(&paths, &mut state).unwrap(), 0);
    }

    #[test]
    fn locate_default_config_without_binary_is_none() {
        assert!(locate_default_config(None).is_none());
    }
}
