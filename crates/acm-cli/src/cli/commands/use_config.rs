//! `acm use <aces|default|PATH>` – rewrite the active configuration pointer.

use anyhow::Result;
use std::path::PathBuf;

use acm_core::config::AcmConfig;
use acm_core::host::Host;
use acm_core::paths::AcmPaths;
use acm_core::state::ManagerState;
use acm_core::switch::{self, ConfigTarget};

fn parse_target(raw: &str) -> ConfigTarget {
    match raw.to_ascii_lowercase().as_str() {
        "aces" => ConfigTarget::Aces,
        "default" => ConfigTarget::Default,
        _ => ConfigTarget::Path(PathBuf::from(raw)),
    }
}

pub fn run_use(
    cfg: &AcmConfig,
    paths: &AcmPaths,
    host: &dyn Host,
    target: &str,
    no_restart: bool,
) -> Result<()> {
    let target = parse_target(target);
    let auto_restart = cfg.auto_restart && !no_restart;
    let mut state = ManagerState::load(&paths.state_file());

    let outcome = switch::switch_to(host, paths, &mut state, target, auto_restart)?;

    match &outcome.pointer {
        Some(p) => println!("Active configuration: {}", p.display()),
        None => println!("Active configuration: host default"),
    }
    if let Some(backup) = &outcome.backup_dir {
        println!("Previous configuration backed up to {}", backup.display());
    }
    if outcome.restarted {
        println!("Host restarted.");
    } else if auto_restart {
        if let Some(err) = &outcome.restart_error {
            println!("Could not restart the host ({err}); restart it manually to apply.");
        }
    } else {
        println!("Restart the host to apply the change.");
    }
    Ok(())
}
