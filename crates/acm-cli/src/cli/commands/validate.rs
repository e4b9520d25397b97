//! `acm validate` – superficial check of the active (or given) config.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use acm_core::config::AcmConfig;
use acm_core::host::Host;
use acm_core::validate;

pub fn run_validate(cfg: &AcmConfig, host: &dyn Host, path: Option<PathBuf>) -> Result<()> {
    let target = match path {
        Some(p) => p,
        None => match host.active_config()? {
            Some(p) => p,
            None => {
                println!("No configuration override set (host default in use).");
                return Ok(());
            }
        },
    };

    match validate::validate_config(&target, &cfg.deny_rules()) {
        Ok(()) => {
            println!("Looks OK: {}", target.display());
            Ok(())
        }
        Err(failure) => Err(anyhow!("invalid OCIO config: {failure}")),
    }
}
