//! ZIP extraction and config staging for downloaded bundles.
//!
//! A bundle is valid when the extracted tree contains exactly one directory
//! holding a `config.ocio`; that directory (LUTs and all) is staged as the
//! installed configuration.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::CONFIG_FILE_NAME;

/// Reasons a downloaded archive is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Entry name escapes the extraction root (absolute or `..`).
    #[error("unsafe path in archive: {0}")]
    UnsafePath(String),
    #[error("archive contains no {CONFIG_FILE_NAME}")]
    NoConfig,
    /// More than one candidate config directory; refuse to guess.
    #[error("archive contains {0} directories with a {CONFIG_FILE_NAME}, expected exactly one")]
    Ambiguous(usize),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Extracts `zip_path` into `out_dir`, rejecting entries whose names would
/// escape it. `__MACOSX` resource-fork junk is skipped.
pub fn extract_zip(zip_path: &Path, out_dir: &Path) -> Result<(), ArchiveError> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if name.starts_with("__MACOSX/") {
            continue;
        }
        let Some(rel) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(ArchiveError::UnsafePath(name));
        };
        let target = out_dir.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

/// Finds the single directory under `root` containing a `config.ocio`.
pub fn locate_config(root: &Path) -> Result<PathBuf, ArchiveError> {
    let mut found = Vec::new();
    collect_config_dirs(root, &mut found)?;
    match found.len() {
        0 => Err(ArchiveError::NoConfig),
        1 => Ok(found.remove(0)),
        n => Err(ArchiveError::Ambiguous(n)),
    }
}

fn collect_config_dirs(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut has_config = false;
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if entry.file_name() == CONFIG_FILE_NAME {
            has_config = true;
        }
    }
    if has_config {
        found.push(dir.to_path_buf());
    }
    for sub in subdirs {
        collect_config_dirs(&sub, found)?;
    }
    Ok(())
}

/// Replaces `final_dir` with a copy of `src_dir` (the directory holding the
/// located `config.ocio`). Not atomic; a failed stage is a failed install
/// the caller reports for retry.
pub fn stage_config(src_dir: &Path, final_dir: &Path) -> Result<(), ArchiveError> {
    if final_dir.exists() {
        fs::remove_dir_all(final_dir)?;
    }
    copy_dir_recursive(src_dir, final_dir)?;
    Ok(())
}

/// Plain recursive directory copy; symlinks are followed.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}
