//! GitHub Releases probe for newer configuration bundles.
//!
//! `check-update` asks the configured repo for its latest release and
//! resolves a downloadable ZIP: the first `.zip` asset, or the tag's source
//! archive when the release ships none.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::state::{ManagerState, UpdateCheck};

/// Repo probed when `update_repo` is not configured: the official ASWF
/// ACES config.
pub const DEFAULT_UPDATE_REPO: &str = "AcademySoftwareFoundation/OpenColorIO-Config-ACES";

/// Resolved release: tag plus a URL `install --url` can consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub name: String,
    pub prerelease: bool,
    pub asset_url: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    #[serde(default)]
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    tag_name: Option<String>,
    name: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    created_at: String,
    html_url: Option<String>,
    #[serde(default)]
    assets: Vec<GhAsset>,
}

impl GhRelease {
    fn into_info(self, repo: &str) -> ReleaseInfo {
        let tag = self.tag_name.unwrap_or_default();
        let asset_url = self
            .assets
            .iter()
            .find(|a| a.name.to_lowercase().ends_with(".zip"))
            .map(|a| a.browser_download_url.clone())
            .or_else(|| {
                // Fall back to the tag source archive.
                (!tag.is_empty()).then(|| {
                    format!("https://github.com/{repo}/archive/refs/tags/{tag}.zip")
                })
            });
        ReleaseInfo {
            tag,
            name: self.name.unwrap_or_default(),
            prerelease: self.prerelease,
            asset_url,
            html_url: self.html_url,
        }
    }
}

/// GET with GitHub-friendly headers, returning the raw body.
fn http_get(url: &str) -> Result<Vec<u8>> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.useragent("acm-config-manager")?;
    easy.connect_timeout(Duration::from_secs(10))?;
    easy.timeout(Duration::from_secs(30))?;

    let mut list = curl::easy::List::new();
    list.append("Accept: application/vnd.github+json")?;
    easy.http_headers(list)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("GET request failed")?;
    }
    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        bail!("GET {} returned HTTP {}", url, code);
    }
    Ok(body)
}

/// Queries the latest (non-draft) release of `owner/name`. Without
/// prereleases the dedicated `releases/latest` endpoint is used; with them,
/// the newest matching entry of the release list.
pub fn latest_release(repo: &str, include_prereleases: bool) -> Result<ReleaseInfo> {
    if !include_prereleases {
        let url = format!("https://api.github.com/repos/{repo}/releases/latest");
        let body = http_get(&url)?;
        let release: GhRelease =
            serde_json::from_slice(&body).context("parse release response")?;
        if release.draft {
            bail!("latest release of {} is a draft", repo);
        }
        return Ok(release.into_info(repo));
    }

    let url = format!("https://api.github.com/repos/{repo}/releases");
    let body = http_get(&url)?;
    let mut releases: Vec<GhRelease> =
        serde_json::from_slice(&body).context("parse release list")?;
    releases.retain(|r| !r.draft);
    releases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    match releases.into_iter().next() {
        Some(r) => Ok(r.into_info(repo)),
        None => bail!("{} has no published releases", repo),
    }
}

/// Probes for the latest release and caches the result in state.
pub fn check_update(
    repo: &str,
    include_prereleases: bool,
    state: &mut ManagerState,
    state_path: &Path,
) -> Result<UpdateCheck> {
    let info = latest_release(repo, include_prereleases)?;
    let check = UpdateCheck {
        latest_tag: info.tag.clone(),
        asset_url: info.asset_url.clone(),
        html_url: info.html_url.clone(),
        checked_at: chrono::Utc::now().timestamp(),
    };
    state.update = Some(check.clone());
    state.save(state_path)?;
    Ok(check)
}

/// Parses tags like `v2.1.0` or `1.2` into a comparable triple; anything
/// unparsable collapses to zeros.
pub fn version_triple(tag: &str) -> (u64, u64, u64) {
    let trimmed = tag.trim().trim_start_matches(['v', 'V']);
    let mut parts = trimmed.split('.').map(|p| {
        let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<u64>().unwrap_or(0)
    });
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}
