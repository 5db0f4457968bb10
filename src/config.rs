//! Configuration Management
//!
//! Handles persistent configuration storage for awx-proxy. Passwords are
//! never stored here; they come from the environment or tower-cli files.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// AWX host
    #[serde(default)]
    pub host: Option<String>,
    /// Username to authenticate as
    #[serde(default)]
    pub username: Option<String>,
    /// Verify TLS certificates
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    /// Organization used when a command does not name one
    #[serde(default)]
    pub default_organization: Option<String>,
    /// Log level for the CLI
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awx-proxy").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Organization to fall back on (config > "Default")
    pub fn effective_organization(&self) -> String {
        self.default_organization
            .clone()
            .unwrap_or_else(|| "Default".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            host: Some("https://awx.example.com".into()),
            username: Some("admin".into()),
            verify_ssl: Some(false),
            default_organization: Some("Carbon".into()),
            log_level: None,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_organization(), "Default");
    }
}
