//! `acm uninstall` – remove the installed bundle (backups stay).

use anyhow::Result;

use acm_core::backup;
use acm_core::host::Host;
use acm_core::install;
use acm_core::paths::AcmPaths;
use acm_core::state::ManagerState;

pub fn run_uninstall(paths: &AcmPaths, host: &dyn Host, purge_backups: bool) -> Result<()> {
    let mut state = ManagerState::load(&paths.state_file());

    if paths.is_installed() {
        let active = host.active_config()?;
        install::uninstall(paths, active.as_deref(), &mut state)?;
        println!("ACES configuration removed from {}", paths.aces_dir().display());
    } else {
        println!("No ACES configuration is installed.");
    }

    if purge_backups {
        let removed = backup::purge_backups(paths, &mut state)?;
        println!("Removed {removed} backup(s).");
    }
    Ok(())
}
