//! `acm status` – show install, pointer, and backup state.

use anyhow::Result;
use chrono::{Local, TimeZone};

use acm_core::host::Host;
use acm_core::paths::AcmPaths;
use acm_core::state::ManagerState;

fn format_unix(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

pub fn run_status(paths: &AcmPaths, host: &dyn Host) -> Result<()> {
    let state = ManagerState::load(&paths.state_file());

    match &state.install {
        Some(install) if paths.is_installed() => {
            println!("Installed:  {}", paths.installed_config_path().display());
            println!("Source:     {}", install.source_url);
            println!("Installed:  {}", format_unix(install.installed_at));
            println!("SHA-256:    {}", install.config_sha256);
        }
        _ if paths.is_installed() => {
            // Config present but no record (state lost); still report it.
            println!("Installed:  {}", paths.installed_config_path().display());
        }
        _ => println!("Installed:  no"),
    }

    match host.active_config()? {
        Some(p) if p == paths.installed_config_path() => {
            println!("Active:     ACES ({})", p.display())
        }
        Some(p) => println!("Active:     custom ({})", p.display()),
        None => println!("Active:     host default"),
    }

    println!("Backups:    {}", state.backups.len());
    for b in state.backups.iter().rev().take(3) {
        println!("  {} <- {}", b.backup_dir.display(), b.src_dir.display());
    }

    if let Some(update) = &state.update {
        println!(
            "Last update check: {} (latest {})",
            format_unix(update.checked_at),
            update.latest_tag
        );
    }
    Ok(())
}
