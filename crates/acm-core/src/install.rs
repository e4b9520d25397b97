//! Install orchestration: download, extract, locate, sniff, stage.
//!
//! Control flow per bundle URL: clean the install dir, download the ZIP
//! next to it, extract into a scratch dir, find the single config
//! directory, reject deny-listed configs, stage into `aces/config/`, then
//! clean up the transfer artifacts. The active pointer is never touched
//! here; only `switch` rewrites it.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::archive::{self, ArchiveError};
use crate::checksum;
use crate::config::{DenyRule, DownloadConfig};
use crate::download::{self, DownloadError};
use crate::paths::{AcmPaths, CONFIG_FILE_NAME};
use crate::state::{InstallRecord, ManagerState};
use crate::validate::{self, ValidationFailure};

/// Step currently running, for progress display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstallPhase {
    Cleaning,
    Downloading { received: u64, total: Option<u64> },
    Extracting,
    Locating,
    Staging,
    Done,
}

/// Progress callback invoked as the install advances.
pub type PhaseFn<'a> = &'a mut dyn FnMut(InstallPhase);

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("download failed: {0}")]
    Download(DownloadError),
    #[error("invalid archive: {0}")]
    Archive(#[from] ArchiveError),
    /// Extracted config matched the deny list or failed the sniff.
    #[error("downloaded config rejected: {0}")]
    Rejected(ValidationFailure),
    /// User cancelled; previous state is untouched apart from the cleaned
    /// install dir.
    #[error("installation cancelled")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DownloadError> for InstallError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::Cancelled => InstallError::Cancelled,
            other => InstallError::Download(other),
        }
    }
}

/// Downloads and installs the bundle at `url`. On success the staged config
/// file path is returned and an install record is persisted.
pub fn install_from_url(
    paths: &AcmPaths,
    opts: &DownloadConfig,
    deny_rules: &[DenyRule],
    url: &str,
    state: &mut ManagerState,
    mut phase: Option<PhaseFn<'_>>,
    abort: Option<Arc<AtomicBool>>,
) -> Result<PathBuf, InstallError> {
    let mut report = |p: InstallPhase| {
        if let Some(cb) = phase.as_mut() {
            cb(p);
        }
    };

    report(InstallPhase::Cleaning);
    clean_install_dir(paths)?;

    let zip_dest = paths.aces_dir().join("aces_config.zip");
    report(InstallPhase::Downloading {
        received: 0,
        total: None,
    });
    {
        let mut on_bytes = |received: u64, total: Option<u64>| {
            report(InstallPhase::Downloading { received, total });
        };
        download::fetch_to_file(url, &zip_dest, opts, Some(&mut on_bytes), abort.clone())?;
    }
    tracing::info!("downloaded bundle from {}", url);

    if is_aborted(&abort) {
        let _ = std::fs::remove_file(&zip_dest);
        return Err(InstallError::Cancelled);
    }

    let extract_root = paths.aces_dir().join("_extract");
    let result = install_from_archive_inner(
        paths,
        deny_rules,
        &zip_dest,
        &extract_root,
        url,
        state,
        &mut report,
        &abort,
    );

    // Transfer artifacts go away on success and failure alike.
    let _ = std::fs::remove_file(&zip_dest);
    let _ = std::fs::remove_dir_all(&extract_root);

    result
}

/// Installs from an already-downloaded archive. Split out so the non-network
/// part of the pipeline is testable on its own.
pub fn install_from_archive(
    paths: &AcmPaths,
    deny_rules: &[DenyRule],
    zip_path: &Path,
    source_url: &str,
    state: &mut ManagerState,
) -> Result<PathBuf, InstallError> {
    clean_install_dir(paths)?;
    let extract_root = paths.aces_dir().join("_extract");
    let mut report = |_p: InstallPhase| {};
    let result = install_from_archive_inner(
        paths,
        deny_rules,
        zip_path,
        &extract_root,
        source_url,
        state,
        &mut report,
        &None,
    );
    let _ = std::fs::remove_dir_all(&extract_root);
    result
}

#[allow(clippy::too_many_arguments)]
fn install_from_archive_inner(
    paths: &AcmPaths,
    deny_rules: &[DenyRule],
    zip_path: &Path,
    extract_root: &Path,
    source_url: &str,
    state: &mut ManagerState,
    report: &mut dyn FnMut(InstallPhase),
    abort: &Option<Arc<AtomicBool>>,
) -> Result<PathBuf, InstallError> {
    report(InstallPhase::Extracting);
    std::fs::create_dir_all(extract_root)
        .with_context(|| format!("create {}", extract_root.display()))?;
    archive::extract_zip(zip_path, extract_root)?;

    report(InstallPhase::Locating);
    let config_dir = archive::locate_config(extract_root)?;
    let config_file = config_dir.join(CONFIG_FILE_NAME);
    if let Err(failure) = validate::validate_config(&config_file, deny_rules) {
        return Err(InstallError::Rejected(failure));
    }

    if is_aborted(abort) {
        return Err(InstallError::Cancelled);
    }

    report(InstallPhase::Staging);
    let final_dir = paths.staged_config_dir();
    archive::stage_config(&config_dir, &final_dir)?;
    let installed = paths.installed_config_path();

    let digest = checksum::sha256_path(&installed)?;
    state.install = Some(InstallRecord {
        source_url: source_url.to_string(),
        installed_at: chrono::Utc::now().timestamp(),
        config_sha256: digest,
    });
    state.save(&paths.state_file())?;

    report(InstallPhase::Done);
    tracing::info!("ACES configuration installed at {}", installed.display());
    Ok(installed)
}

/// Tries each candidate URL in order; the first success wins. Cancellation
/// stops the whole run. All candidates failing yields the last error.
pub fn install_from_candidates(
    paths: &AcmPaths,
    opts: &DownloadConfig,
    deny_rules: &[DenyRule],
    urls: &[String],
    state: &mut ManagerState,
    mut phase: Option<PhaseFn<'_>>,
    abort: Option<Arc<AtomicBool>>,
) -> Result<(String, PathBuf), InstallError> {
    let mut last_err = None;
    for url in urls {
        match install_from_url(
            paths,
            opts,
            deny_rules,
            url,
            state,
            phase.as_mut().map(|cb| &mut **cb as PhaseFn<'_>),
            abort.clone(),
        ) {
            Ok(installed) => return Ok((url.clone(), installed)),
            Err(InstallError::Cancelled) => return Err(InstallError::Cancelled),
            Err(e) => {
                tracing::warn!("install from {} failed: {}", url, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        InstallError::Other(anyhow::anyhow!("no bundle source URLs configured"))
    }))
}

/// Removes the installed bundle and its record. Refuses while ACES is the
/// active pointer; switch to default first.
pub fn uninstall(
    paths: &AcmPaths,
    active_pointer: Option<&Path>,
    state: &mut ManagerState,
) -> Result<(), InstallError> {
    if let Some(active) = active_pointer {
        let installed = paths.installed_config_path();
        if active == installed.as_path()
            || matches!(
                (active.canonicalize(), installed.canonicalize()),
                (Ok(a), Ok(b)) if a == b
            )
        {
            return Err(InstallError::Other(anyhow::anyhow!(
                "cannot uninstall while the ACES configuration is active; switch to default first"
            )));
        }
    }
    let aces_dir = paths.aces_dir();
    if aces_dir.exists() {
        std::fs::remove_dir_all(&aces_dir)
            .with_context(|| format!("remove {}", aces_dir.display()))?;
    }
    state.install = None;
    state.save(&paths.state_file())?;
    tracing::info!("removed installed ACES configuration");
    Ok(())
}

fn is_aborted(abort: &Option<Arc<AtomicBool>>) -> bool {
    abort
        .as_ref()
        .map(|a| a.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Empties the install dir so a fresh bundle never mixes with stale files.
fn clean_install_dir(paths: &AcmPaths) -> Result<(), InstallError> {
    paths.ensure_dirs()?;
    let aces_dir = paths.aces_dir();
    for entry in std::fs::read_dir(&aces_dir)
        .with_context(|| format!("read {}", aces_dir.display()))?
    {
        let entry = entry.map_err(|e| InstallError::Other(e.into()))?;
        let path = entry.path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.with_context(|| format!("remove stale {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_deny_rules;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_bundle(path: &Path, config_content: &str) {
        let file = File::create(path).unwrap();
        let mut zw = ZipWriter::new(file);
        zw.start_file("repo-main/config/config.ocio", FileOptions::default())
            .unwrap();
        zw.write_all(config_content.as_bytes()).unwrap();
        zw.start_file("repo-main/config/luts/lin.spi1d", FileOptions::default())
            .unwrap();
        zw.write_all(b"lut data").unwrap();
        zw.finish().unwrap();
    }

    #[test]
    fn install_from_archive_stages_single_config() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let zip = tmp.path().join("bundle.zip");
        write_bundle(&zip, "ocio_profile_version: 2\n");

        let installed = install_from_archive(
            &paths,
            &default_deny_rules(),
            &zip,
            "https://example.com/bundle.zip",
            &mut state,
        )
        .unwrap();
        assert_eq!(installed, paths.installed_config_path());
        assert!(installed.is_file());
        assert!(paths.staged_config_dir().join("luts").join("lin.spi1d").is_file());

        let record = state.install.as_ref().unwrap();
        assert_eq!(record.source_url, "https://example.com/bundle.zip");
        assert_eq!(record.config_sha256.len(), 64);

        // Scratch artifacts are gone.
        assert!(!paths.aces_dir().join("_extract").exists());
    }

    #[test]
    fn reinstall_replaces_previous_bundle() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();

        let zip1 = tmp.path().join("one.zip");
        write_bundle(&zip1, "ocio_profile_version: 2\n# one\n");
        install_from_archive(&paths, &[], &zip1, "https://example.com/1.zip", &mut state).unwrap();
        let first_digest = state.install.as_ref().unwrap().config_sha256.clone();

        let zip2 = tmp.path().join("two.zip");
        write_bundle(&zip2, "ocio_profile_version: 2\n# two\n");
        install_from_archive(&paths, &[], &zip2, "https://example.com/2.zip", &mut state).unwrap();
        let second = state.install.as_ref().unwrap();
        assert_eq!(second.source_url, "https://example.com/2.zip");
        assert_ne!(second.config_sha256, first_digest);
    }

    #[test]
    fn deny_listed_bundle_is_rejected() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let zip = tmp.path().join("bad.zip");
        write_bundle(
            &zip,
            "ocio_profile_version: 2\nroles:\n  XYZ: xyz\ncolorspaces:\n  name: XYZ\n",
        );

        let err = install_from_archive(
            &paths,
            &default_deny_rules(),
            &zip,
            "https://example.com/bad.zip",
            &mut state,
        )
        .unwrap_err();
        assert!(matches!(err, InstallError::Rejected(_)));
        assert!(state.install.is_none());
        assert!(!paths.is_installed());
    }

    #[test]
    fn bundle_without_config_is_invalid_archive() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let zip = tmp.path().join("empty.zip");
        let file = File::create(&zip).unwrap();
        let mut zw = ZipWriter::new(file);
        zw.start_file("readme.txt", FileOptions::default()).unwrap();
        zw.write_all(b"no config here").unwrap();
        zw.finish().unwrap();

        let err =
            install_from_archive(&paths, &[], &zip, "https://example.com/e.zip", &mut state)
                .unwrap_err();
        assert!(matches!(
            err,
            InstallError::Archive(ArchiveError::NoConfig)
        ));
    }

    #[test]
    fn uninstall_refuses_while_active() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let zip = tmp.path().join("bundle.zip");
        write_bundle(&zip, "ocio_profile_version: 2\n");
        let installed =
            install_from_archive(&paths, &[], &zip, "https://example.com/b.zip", &mut state)
                .unwrap();

        let err = uninstall(&paths, Some(&installed), &mut state).unwrap_err();
        assert!(err.to_string().contains("switch to default first"));
        assert!(paths.is_installed());
    }

    #[test]
    fn uninstall_removes_bundle_and_record() {
        let tmp = tempdir().unwrap();
        let paths = AcmPaths::at_root(&tmp.path().join("data"));
        let mut state = ManagerState::default();
        let zip = tmp.path().join("bundle.zip");
        write_bundle(&zip, "ocio_profile_version: 2\n");
        install_from_archive(&paths, &[], &zip, "https://example.com/b.zip", &mut state).unwrap();

        uninstall(&paths, None, &mut state).unwrap();
        assert!(!paths.is_installed());
        assert!(state.install.is_none());
        let reloaded = ManagerState::load(&paths.state_file());
        assert!(reloaded.install.is_none());
    }
}
