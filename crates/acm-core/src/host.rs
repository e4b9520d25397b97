//! Narrow capability interface to the host application.
//!
//! The host owns the active-configuration pointer and its own lifecycle;
//! everything else in this crate talks to it through [`Host`] so the
//! install/backup/switch logic stays independently testable.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{AcmConfig, HostConfig};

/// Environment variable mirroring the active configuration pointer. A host
/// process started with it set inherits the choice without re-reading
/// preferences.
pub const OCIO_ENV: &str = "OCIO";

/// Capabilities the manager needs from the host.
pub trait Host {
    /// Current active-configuration pointer; `None` means the host's
    /// built-in default is in effect.
    fn active_config(&self) -> Result<Option<PathBuf>>;

    /// Set (`Some`) or clear (`None`) the active-configuration pointer.
    fn set_active_config(&self, path: Option<&Path>) -> Result<()>;

    /// Host executable, when known. Used to locate the shipped default
    /// config next to it.
    fn binary_path(&self) -> Option<PathBuf>;

    /// Relaunch the host process so the new configuration takes effect.
    fn restart(&self) -> Result<()>;
}

/// File-backed host adapter: the pointer is a single-line file in the host
/// configuration directory, mirrored into the `OCIO` environment variable
/// (persisted per-user on Windows) so restarts inherit it.
#[derive(Debug, Clone)]
pub struct PrefsHost {
    pointer_file: PathBuf,
    binary: Option<PathBuf>,
    mirror_env: bool,
}

impl PrefsHost {
    pub fn new(pointer_file: PathBuf, binary: Option<PathBuf>, mirror_env: bool) -> Self {
        Self {
            pointer_file,
            binary,
            mirror_env,
        }
    }

    /// Build from config, defaulting the pointer file to
    /// `~/.config/acm/active_config`.
    pub fn from_config(cfg: &AcmConfig) -> Result<Self> {
        let HostConfig {
            pointer_file,
            binary,
            mirror_env,
        } = cfg.host.clone();
        let pointer_file = match pointer_file {
            Some(p) => p,
            None => xdg::BaseDirectories::with_prefix("acm")?.place_config_file("active_config")?,
        };
        Ok(Self::new(pointer_file, binary, mirror_env))
    }

    pub fn pointer_file(&self) -> &Path {
        &self.pointer_file
    }
}

impl Host for PrefsHost {
    fn active_config(&self) -> Result<Option<PathBuf>> {
        let raw = match std::fs::read_to_string(&self.pointer_file) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read pointer {}", self.pointer_file.display()))
            }
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(trimmed)))
    }

    fn set_active_config(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(p) => {
                if let Some(parent) = self.pointer_file.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                std::fs::write(&self.pointer_file, format!("{}\n", p.display()))
                    .with_context(|| format!("write pointer {}", self.pointer_file.display()))?;
                if self.mirror_env {
                    std::env::set_var(OCIO_ENV, p);
                    persist_user_env(OCIO_ENV, &p.display().to_string());
                }
                tracing::info!("active config pointer set to {}", p.display());
            }
            None => {
                match std::fs::remove_file(&self.pointer_file) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| {
                            format!("remove pointer {}", self.pointer_file.display())
                        })
                    }
                }
                if self.mirror_env {
                    std::env::remove_var(OCIO_ENV);
                    remove_user_env(OCIO_ENV);
                }
                tracing::info!("active config pointer cleared (host default)");
            }
        }
        Ok(())
    }

    fn binary_path(&self) -> Option<PathBuf> {
        self.binary.clone()
    }

    fn restart(&self) -> Result<()> {
        let Some(binary) = &self.binary else {
            bail!("host binary not configured; restart the host manually");
        };
        // Env already carries the OCIO mirror; the child inherits it.
        std::process::Command::new(binary)
            .spawn()
            .with_context(|| format!("spawn host {}", binary.display()))?;
        tracing::info!("relaunched host {}", binary.display());
        Ok(())
    }
}

/// Persist a per-user environment variable on Windows (HKCU, via setx) so
/// host launches outside this process still inherit the choice. No-op
/// elsewhere; on POSIX the pointer file is the durable record.
#[cfg(windows)]
fn persist_user_env(name: &str, value: &str) {
    let result = std::process::Command::new("setx").args([name, value]).status();
    if let Err(e) = result {
        tracing::warn!("could not persist {} user env var: {}", name, e);
    }
}

#[cfg(not(windows))]
fn persist_user_env(_name: &str, _value: &str) {}

/// Remove the persisted per-user environment variable on Windows.
#[cfg(windows)]
fn remove_user_env(name: &str) {
    let result = std::process::Command::new("reg")
        .args(["delete", r"HKCU\Environment", "/V", name, "/F"])
        .status();
    if let Err(e) = result {
        tracing::warn!("could not remove persisted {} user env var: {}", name, e);
    }
}

#[cfg(not(windows))]
fn remove_user_env(_name: &str) {}
