//! Connection settings
//!
//! Settings are resolved once and handed to [`AwxClient`](super::client::AwxClient)
//! explicitly. Sources, highest priority first: explicit overrides, `TOWER_*`
//! environment variables, tower-cli style `tower_cli.cfg` files, the crate
//! config file, built-in defaults.

use crate::config::Config;
use crate::error::{AwxError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_USERNAME: &str = "admin";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully resolved connection settings for one AWX server
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConnectionSettings {
    /// Build settings from explicit values
    pub fn new(host: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            host: normalize_host(host)?,
            username: username.to_string(),
            password: password.to_string(),
            verify_ssl: true,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve settings from every source, explicit overrides winning
    pub fn resolve(overrides: SettingsOverrides, config: &Config) -> Result<Self> {
        let mut merged = overrides.or(SettingsOverrides::from_env());

        for path in tower_cli_config_paths() {
            if let Some(file) = read_tower_cli_config(&path) {
                tracing::debug!("Loaded tower-cli settings from {:?}", path);
                merged = merged.or(file);
            }
        }

        merged = merged.or(SettingsOverrides {
            host: config.host.clone(),
            username: config.username.clone(),
            password: None,
            verify_ssl: config.verify_ssl,
        });

        let host = merged.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let settings = Self::new(
            &host,
            merged.username.as_deref().unwrap_or(DEFAULT_USERNAME),
            merged.password.as_deref().unwrap_or_default(),
        )?;

        Ok(settings.with_verify_ssl(merged.verify_ssl.unwrap_or(true)))
    }

    /// Base URL of the versioned REST API
    pub fn api_base(&self) -> String {
        format!("{}/api/v2", self.host)
    }
}

/// Partial settings from a single source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_ssl: Option<bool>,
}

impl SettingsOverrides {
    /// Fill unset values from a lower priority source
    pub fn or(self, lower: SettingsOverrides) -> Self {
        Self {
            host: self.host.or(lower.host),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            verify_ssl: self.verify_ssl.or(lower.verify_ssl),
        }
    }

    /// Read `TOWER_HOST`, `TOWER_USERNAME`, `TOWER_PASSWORD`, `TOWER_VERIFY_SSL`
    pub fn from_env() -> Self {
        Self {
            host: non_empty_env("TOWER_HOST"),
            username: non_empty_env("TOWER_USERNAME"),
            password: std::env::var("TOWER_PASSWORD").ok(),
            verify_ssl: non_empty_env("TOWER_VERIFY_SSL").and_then(|v| parse_bool(&v)),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring invalid boolean value: {}", value);
            None
        }
    }
}

/// Normalize a host: add a scheme when missing, strip trailing slashes
pub fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(AwxError::Config("AWX host must not be empty".to_string()));
    }

    let host = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    url::Url::parse(&host).map_err(|e| AwxError::Config(format!("Invalid AWX host {}: {}", host, e)))?;

    Ok(host)
}

/// tower-cli config files, lowest priority last
fn tower_cli_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(path) = std::env::var("TOWER_CLI_CONFIG") {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from(".tower_cli.cfg"));
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".tower_cli.cfg"));
    }
    paths.push(PathBuf::from("/etc/tower/tower_cli.cfg"));

    paths
}

fn read_tower_cli_config(path: &Path) -> Option<SettingsOverrides> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(parse_tower_cli_config(&content))
}

/// Parse the `[general]` section of a tower-cli INI file
///
/// Keys outside any section are accepted too, tower-cli did the same.
pub fn parse_tower_cli_config(content: &str) -> SettingsOverrides {
    let mut settings = SettingsOverrides::default();
    let mut in_general_section = true;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_general_section = line == "[general]";
            continue;
        }
        if !in_general_section {
            continue;
        }

        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let value = value.trim().to_string();

        match key.trim() {
            "host" => settings.host = Some(value),
            "username" => settings.username = Some(value),
            "password" => settings.password = Some(value),
            "verify_ssl" => settings.verify_ssl = parse_bool(&value),
            _ => {}
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host_adds_scheme_and_strips_slash() {
        assert_eq!(normalize_host("tower.example.com/").unwrap(), "https://tower.example.com");
        assert_eq!(normalize_host("http://localhost:8043").unwrap(), "http://localhost:8043");
    }

    #[test]
    fn test_normalize_host_rejects_empty() {
        assert!(matches!(normalize_host("  "), Err(AwxError::Config(_))));
    }

    #[test]
    fn test_parse_tower_cli_config_general_section() {
        let content = r#"
# tower-cli settings
[general]
host = https://awx.example.com
username = admin
password = secret
verify_ssl = false

[other]
host = ignored
"#;
        let settings = parse_tower_cli_config(content);
        assert_eq!(settings.host.as_deref(), Some("https://awx.example.com"));
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(settings.verify_ssl, Some(false));
    }

    #[test]
    fn test_overrides_keep_higher_priority_values() {
        let high = SettingsOverrides {
            host: Some("https://a".into()),
            ..Default::default()
        };
        let low = SettingsOverrides {
            host: Some("https://b".into()),
            username: Some("bob".into()),
            ..Default::default()
        };
        let merged = high.or(low);
        assert_eq!(merged.host.as_deref(), Some("https://a"));
        assert_eq!(merged.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_debug_masks_password() {
        let settings = ConnectionSettings::new("localhost", "admin", "hunter2").unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(settings.api_base(), "https://localhost/api/v2");
    }
}
