//! Known ACES configuration bundle sources and candidate ordering.

use anyhow::{bail, Result};
use url::Url;

/// Default ZIP sources, OCIO v2 first: the official ASWF CG config, then
/// community configs as fallbacks.
pub const DEFAULT_ZIP_URLS: &[&str] = &[
    "https://github.com/AcademySoftwareFoundation/OpenColorIO-Config-ACES/archive/refs/heads/main.zip",
    "https://github.com/thezakman/ACES-blender-colour-management/archive/refs/heads/main.zip",
    "https://github.com/thezakman/ACES-blender-colour-management/archive/refs/heads/master.zip",
    "https://github.com/qweryty/Blender-Optimized-ACES/archive/refs/heads/main.zip",
    "https://github.com/qweryty/Blender-Optimized-ACES/archive/refs/heads/master.zip",
];

/// Reject URLs that are not plain http(s) before handing them to curl.
pub fn check_source_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("unsupported URL scheme '{}' (expected http or https)", other),
    }
}

/// Candidate URLs in download order: the custom URL (when set) first, then
/// the built-in list. A one-shot `--url` override replaces the whole list.
pub fn candidate_urls(custom: Option<&str>) -> Vec<String> {
    let mut urls = Vec::with_capacity(DEFAULT_ZIP_URLS.len() + 1);
    if let Some(c) = custom {
        let c = c.trim();
        if !c.is_empty() {
            urls.push(c.to_string());
        }
    }
    urls.extend(DEFAULT_ZIP_URLS.iter().map(|s| s.to_string()));
    urls
}
