use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Download tuning (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Overall transfer timeout in seconds. Config bundles can be large.
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 3600,
        }
    }
}

/// How to reach the host application whose color management we manage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Path of the active-configuration pointer file. When unset, the
    /// pointer lives under the acm config directory.
    #[serde(default)]
    pub pointer_file: Option<PathBuf>,
    /// Host executable, used for restart and for locating the shipped
    /// default config (searched near the binary).
    #[serde(default)]
    pub binary: Option<PathBuf>,
    /// Mirror the active pointer into the `OCIO` environment variable so a
    /// restarted host inherits the choice without re-reading preferences.
    #[serde(default = "default_true")]
    pub mirror_env: bool,
}

fn default_true() -> bool {
    true
}

/// One deny-list rule: the config is rejected when every substring in
/// `all_of` appears in the file. Kept as data so site-specific
/// incompatibilities can be added without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenyRule {
    /// Short rule identifier shown in logs.
    pub name: String,
    /// Substrings that must all be present for the rule to match.
    pub all_of: Vec<String>,
    /// Human-readable reason reported on rejection.
    pub reason: String,
}

/// Built-in deny list: configs with both a `XYZ` role and a colorspace
/// named `XYZ` break OCIO v2 hosts.
pub fn default_deny_rules() -> Vec<DenyRule> {
    vec![DenyRule {
        name: "xyz-role-name-conflict".to_string(),
        all_of: vec![
            "roles:".to_string(),
            "XYZ:".to_string(),
            "name: XYZ".to_string(),
        ],
        reason: "config defines both a role 'XYZ' and a colorspace named 'XYZ' \
                 (incompatible with OCIO v2 hosts)"
            .to_string(),
    }]
}

/// Global configuration loaded from `~/.config/acm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmConfig {
    /// Custom ZIP source URL tried before the built-in sources.
    #[serde(default)]
    pub custom_source_url: Option<String>,
    /// Restart the host automatically after switching configurations.
    pub auto_restart: bool,
    /// GitHub repo (`owner/name`) probed by `check-update`.
    #[serde(default)]
    pub update_repo: Option<String>,
    /// Consider prereleases when probing for updates.
    #[serde(default)]
    pub include_prereleases: bool,
    /// Optional download tuning; built-in defaults when missing.
    #[serde(default)]
    pub download: Option<DownloadConfig>,
    #[serde(default)]
    pub host: HostConfig,
    /// Deny-list rules applied by the validator. When absent the built-in
    /// list is used; an explicit empty list disables the deny check.
    #[serde(default, rename = "deny")]
    pub deny_rules: Option<Vec<DenyRule>>,
}

impl Default for AcmConfig {
    fn default() -> Self {
        Self {
            custom_source_url: None,
            auto_restart: true,
            update_repo: None,
            include_prereleases: false,
            download: None,
            host: HostConfig {
                pointer_file: None,
                binary: None,
                mirror_env: true,
            },
            deny_rules: None,
        }
    }
}

impl AcmConfig {
    pub fn download(&self) -> DownloadConfig {
        self.download.clone().unwrap_or_default()
    }

    pub fn deny_rules(&self) -> Vec<DenyRule> {
        self.deny_rules.clone().unwrap_or_else(default_deny_rules)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("acm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AcmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AcmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AcmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AcmConfig::default();
        assert!(cfg.auto_restart);
        assert!(cfg.custom_source_url.is_none());
        assert!(cfg.host.mirror_env);
        assert_eq!(cfg.download().connect_timeout_secs, 30);
        assert_eq!(cfg.download().timeout_secs, 3600);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = AcmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AcmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.auto_restart, cfg.auto_restart);
        assert_eq!(parsed.host.mirror_env, cfg.host.mirror_env);
        assert!(parsed.deny_rules.is_none());
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            custom_source_url = "https://example.com/aces.zip"
            auto_restart = false
            update_repo = "AcademySoftwareFoundation/OpenColorIO-Config-ACES"

            [download]
            connect_timeout_secs = 10
            timeout_secs = 600

            [host]
            pointer_file = "/tmp/active_config"
            mirror_env = false
        "#;
        let cfg: AcmConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.custom_source_url.as_deref(),
            Some("https://example.com/aces.zip")
        );
        assert!(!cfg.auto_restart);
        assert_eq!(cfg.download().timeout_secs, 600);
        assert!(!cfg.host.mirror_env);
        assert_eq!(
            cfg.host.pointer_file.as_deref(),
            Some(std::path::Path::new("/tmp/active_config"))
        );
    }

    #[test]
    fn config_toml_deny_rules() {
        let toml = r#"
            auto_restart = true

            [[deny]]
            name = "legacy-v1"
            all_of = ["ocio_profile_version: 1"]
            reason = "OCIO v1 profiles are not supported by the host"
        "#;
        let cfg: AcmConfig = toml::from_str(toml).unwrap();
        let rules = cfg.deny_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "legacy-v1");
        assert_eq!(rules[0].all_of, vec!["ocio_profile_version: 1"]);
    }

    #[test]
    fn builtin_deny_list_has_xyz_conflict_rule() {
        let rules = default_deny_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "xyz-role-name-conflict");
        assert!(rules[0].all_of.contains(&"name: XYZ".to_string()));
    }
}
