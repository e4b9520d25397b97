//! CLI for the acm configuration manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use acm_core::config;
use acm_core::host::PrefsHost;
use acm_core::paths::AcmPaths;

use commands::{
    run_backup, run_check_update, run_install, run_status, run_uninstall, run_use, run_validate,
};

/// Top-level CLI for the acm configuration manager.
#[derive(Debug, Parser)]
#[command(name = "acm")]
#[command(about = "acm: install and switch ACES OCIO configurations for a DCC host", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and install an ACES OCIO configuration bundle.
    Install {
        /// Install from this ZIP URL only, skipping the built-in sources.
        #[arg(long)]
        url: Option<String>,
        /// Resolve the newest release of the update repo and install that.
        #[arg(long, conflicts_with = "url")]
        latest: bool,
    },

    /// Switch the active configuration: `aces`, `default`, or a config file path.
    Use {
        /// Target: `aces`, `default`, or a path (e.g. a backup's config.ocio).
        target: String,
        /// Do not relaunch the host after switching.
        #[arg(long)]
        no_restart: bool,
    },

    /// Show install, active pointer, and backup status.
    Status,

    /// Validate the active configuration, or the given file.
    Validate {
        /// Config file to validate instead of the active one.
        path: Option<PathBuf>,
    },

    /// Back up the currently active configuration now.
    Backup,

    /// Remove the installed ACES configuration.
    Uninstall {
        /// Also delete all backups and their records.
        #[arg(long)]
        purge_backups: bool,
    },

    /// Check the configured repo for a newer bundle release.
    CheckUpdate,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let paths = AcmPaths::from_xdg()?;
        let host = PrefsHost::from_config(&cfg)?;

        match cli.command {
            CliCommand::Install { url, latest } => {
                run_install(&cfg, &paths, url, latest).await?
            }
            CliCommand::Use { target, no_restart } => {
                run_use(&cfg, &paths, &host, &target, no_restart)?
            }
            CliCommand::Status => run_status(&paths, &host)?,
            CliCommand::Validate { path } => run_validate(&cfg, &host, path)?,
            CliCommand::Backup => run_backup(&paths, &host)?,
            CliCommand::Uninstall { purge_backups } => {
                run_uninstall(&paths, &host, purge_backups)?
            }
            CliCommand::CheckUpdate => run_check_update(&cfg, &paths).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
