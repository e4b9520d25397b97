//! `acm install` – download and stage an ACES configuration bundle.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use acm_core::config::AcmConfig;
use acm_core::install::{self, InstallError, InstallPhase};
use acm_core::paths::AcmPaths;
use acm_core::release::{self, DEFAULT_UPDATE_REPO};
use acm_core::sources;
use acm_core::state::ManagerState;

pub async fn run_install(
    cfg: &AcmConfig,
    paths: &AcmPaths,
    url: Option<String>,
    latest: bool,
) -> Result<()> {
    let urls: Vec<String> = if let Some(u) = url {
        sources::check_source_url(&u)?;
        vec![u]
    } else if latest {
        let repo = cfg
            .update_repo
            .clone()
            .unwrap_or_else(|| DEFAULT_UPDATE_REPO.to_string());
        let include_pre = cfg.include_prereleases;
        let info = tokio::task::spawn_blocking(move || {
            release::latest_release(&repo, include_pre)
        })
        .await
        .context("release probe join")??;
        let asset = info
            .asset_url
            .context("latest release has no downloadable ZIP")?;
        println!("Installing release {} from {}", info.tag, asset);
        vec![asset]
    } else {
        sources::candidate_urls(cfg.custom_source_url.as_deref())
    };

    // Ctrl-C flips the abort token; the transfer stops at the next
    // progress callback.
    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!();
                eprintln!("cancelling...");
                abort.store(true, Ordering::Relaxed);
            }
        });
    }

    let opts = cfg.download();
    let deny = cfg.deny_rules();
    let paths = paths.clone();
    let abort_token = Arc::clone(&abort);
    let result = tokio::task::spawn_blocking(move || {
        let mut state = ManagerState::load(&paths.state_file());
        let mut on_phase = print_phase;
        install::install_from_candidates(
            &paths,
            &opts,
            &deny,
            &urls,
            &mut state,
            Some(&mut on_phase),
            Some(abort_token),
        )
    })
    .await
    .context("install task join")?;

    match result {
        Ok((used, installed)) => {
            println!("ACES configuration installed at {}", installed.display());
            println!("Source: {used}");
            println!("Run `acm use aces` to activate it.");
            Ok(())
        }
        // Cancellation is a clean outcome, not an error exit.
        Err(InstallError::Cancelled) => {
            println!("Installation cancelled; nothing was activated.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_phase(phase: InstallPhase) {
    match phase {
        InstallPhase::Cleaning => eprintln!("Cleaning previous installation..."),
        InstallPhase::Downloading { received, total } => match total {
            Some(t) if t > 0 => eprint!(
                "\rDownloading... {} MiB / {} MiB",
                received >> 20,
                t >> 20
            ),
            _ => eprint!("\rDownloading... {} MiB", received >> 20),
        },
        InstallPhase::Extracting => {
            eprintln!();
            eprintln!("Extracting files...");
        }
        InstallPhase::Locating => eprintln!("Locating configuration..."),
        InstallPhase::Staging => eprintln!("Installing configuration..."),
        InstallPhase::Done => eprintln!("Installation complete."),
    }
}
