//! Rewrites the host's active-configuration pointer, with pre-switch backups.
//!
//! Targets: the installed ACES config, the host default (pointer cleared),
//! or an explicit file path (how backups are restored). Exactly one backup
//! is taken per effective switch; switching to the already-active target is
//! a no-op.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::backup;
use crate::host::Host;
use crate::paths::AcmPaths;
use crate::state::ManagerState;

/// What the pointer should be switched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigTarget {
    /// The installed ACES configuration.
    Aces,
    /// The host's built-in default (pointer cleared, env mirror removed).
    Default,
    /// An explicit configuration file, e.g. one of our backups.
    Path(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("ACES configuration is not installed; run install first")]
    NotInstalled,
    #[error("no such configuration file: {}", .0.display())]
    MissingTarget(PathBuf),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result of a switch, for reporting.
#[derive(Debug)]
pub struct SwitchOutcome {
    /// The pointer after the switch; `None` = host default.
    pub pointer: Option<PathBuf>,
    /// Backup taken before the switch, when one was.
    pub backup_dir: Option<PathBuf>,
    /// Whether the host was relaunched.
    pub restarted: bool,
    /// Restart failure, surfaced rather than swallowed; the switch itself
    /// still committed.
    pub restart_error: Option<String>,
}

/// Compare pointer paths the way the host would: canonicalized when both
/// resolve, literal otherwise.
fn same_config(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}

/// Switches the active configuration pointer to `target`.
///
/// Backup policy: when a pointer is
/// currently set and differs from the target, its config directory is
/// backed up; when no pointer is set (host default active) and one is about
/// to be, the shipped default is backed up, once ever.
pub fn switch_to(
    host: &dyn Host,
    paths: &AcmPaths,
    state: &mut ManagerState,
    target: ConfigTarget,
    auto_restart: bool,
) -> Result<SwitchOutcome, SwitchError> {
    let desired: Option<PathBuf> = match &target {
        ConfigTarget::Aces => {
            if !paths.is_installed() {
                return Err(SwitchError::NotInstalled);
            }
            Some(paths.installed_config_path())
        }
        ConfigTarget::Default => None,
        ConfigTarget::Path(p) => {
            if !p.is_file() {
                return Err(SwitchError::MissingTarget(p.clone()));
            }
            Some(p.clone())
        }
    };

    let current = host.active_config()?;

    // Already on the requested target: nothing to do, no backup, no restart.
    let unchanged = match (&current, &desired) {
        (None, None) => true,
        (Some(a), Some(b)) => same_config(a, b),
        _ => false,
    };
    if unchanged {
        tracing::info!("requested configuration is already active");
        return Ok(SwitchOutcome {
            pointer: desired,
            backup_dir: None,
            restarted: false,
            restart_error: None,
        });
    }

    let backup_dir = match &current {
        Some(cur) => backup::backup_active(paths, state, cur)?,
        None if desired.is_some() => backup::backup_default_once(paths, state, host)?,
        None => None,
    };

    host.set_active_config(desired.as_deref())?;

    let (restarted, restart_error) = if auto_restart {
        match host.restart() {
            Ok(()) => (true, None),
            Err(e) => {
                tracing::warn!("host restart failed: {:#}", e);
                (false, Some(format!("{:#}", e)))
            }
        }
    } else {
        (false, None)
    };

    Ok(SwitchOutcome {
        pointer: desired,
        backup_dir,
        restarted,
        restart_error,
    })
}
