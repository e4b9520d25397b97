//! `acm backup` – back up the active configuration on demand.

use anyhow::Result;

use acm_core::backup;
use acm_core::host::Host;
use acm_core::paths::AcmPaths;
use acm_core::state::ManagerState;

pub fn run_backup(paths: &AcmPaths, host: &dyn Host) -> Result<()> {
    let mut state = ManagerState::load(&paths.state_file());

    let backed_up = match host.active_config()? {
        Some(active) => backup::backup_active(paths, &mut state, &active)?,
        // Host default active: back up the shipped config instead (once).
        None => backup::backup_default_once(paths, &mut state, host)?,
    };

    match backed_up {
        Some(dir) => println!("Backed up to {}", dir.display()),
        None => println!("Nothing to back up."),
    }
    Ok(())
}
