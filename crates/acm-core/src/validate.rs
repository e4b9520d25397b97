//! Superficial validation of an OCIO configuration file.
//!
//! Existence, readability, extension, a first-line sniff for
//! `ocio_profile_version`, and the configurable deny-list. No parse of the
//! config's internal structure; the host does that.

use std::fmt;
use std::path::Path;

use crate::config::DenyRule;

/// Why a configuration was rejected. Carries a human-readable reason only;
/// callers print it, they don't branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub reason: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for ValidationFailure {}

fn fail(reason: impl Into<String>) -> Result<(), ValidationFailure> {
    Err(ValidationFailure {
        reason: reason.into(),
    })
}

/// Checks that `path` looks like a usable OCIO config and is not on the
/// deny list. Ok(()) means "looks OK", nothing stronger.
pub fn validate_config(path: &Path, deny_rules: &[DenyRule]) -> Result<(), ValidationFailure> {
    if path.as_os_str().is_empty() {
        return fail("no config path provided");
    }
    if !path.exists() {
        return fail(format!("config path does not exist: {}", path.display()));
    }
    if !path.is_file() {
        return fail(format!("config path is not a file: {}", path.display()));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("ocio") {
        return fail(format!(
            "config path does not end with .ocio: {}",
            path.display()
        ));
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(format!("error reading config file: {}", e)),
    };
    let first_line = content.lines().next().unwrap_or("").trim();
    if !first_line.starts_with("ocio_profile_version") {
        return fail(format!(
            "file does not appear to be a valid OCIO config: {}",
            path.display()
        ));
    }

    if let Some(rule) = matching_deny_rule(&content, deny_rules) {
        tracing::debug!("config {} matched deny rule {}", path.display(), rule.name);
        return fail(rule.reason.clone());
    }

    Ok(())
}

/// Returns the first deny rule whose substrings all appear in `content`.
/// Rough substring checks by design; anything heavier belongs to the host.
pub fn matching_deny_rule<'a>(content: &str, rules: &'a [DenyRule]) -> Option<&'a DenyRule> {
    rules
        .iter()
        .filter(|r| !r.all_of.is_empty())
        .find(|r| r.all_of.iter().all(|needle| content.contains(needle.as_str())))
}
