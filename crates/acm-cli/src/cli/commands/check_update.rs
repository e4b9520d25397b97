//! `acm check-update` – probe the configured repo for a newer bundle.

use anyhow::{Context, Result};

use acm_core::config::AcmConfig;
use acm_core::paths::AcmPaths;
use acm_core::release::{self, DEFAULT_UPDATE_REPO};
use acm_core::state::ManagerState;

pub async fn run_check_update(cfg: &AcmConfig, paths: &AcmPaths) -> Result<()> {
    let repo = cfg
        .update_repo
        .clone()
        .unwrap_or_else(|| DEFAULT_UPDATE_REPO.to_string());
    let include_pre = cfg.include_prereleases;
    let state_path = paths.state_file();

    let check = tokio::task::spawn_blocking({
        let repo = repo.clone();
        move || {
            let mut state = ManagerState::load(&state_path);
            release::check_update(&repo, include_pre, &mut state, &state_path)
        }
    })
    .await
    .context("update check join")??;

    println!("Latest release of {}: {}", repo, check.latest_tag);
    match &check.asset_url {
        Some(url) => println!("Install it with: acm install --url {url}"),
        None => println!("The release publishes no downloadable ZIP."),
    }
    if let Some(html) = &check.html_url {
        println!("Release notes: {html}");
    }
    Ok(())
}
