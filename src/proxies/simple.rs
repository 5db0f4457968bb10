//! Read-only server information: configuration, version and settings

use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ResourceKind, ResourceProxy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version of this client
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server `config/` endpoint
#[derive(Clone)]
pub struct ConfigProxy {
    resource: ResourceProxy,
}

impl ConfigProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Config),
        }
    }

    pub async fn fetch(&self) -> Result<Value> {
        self.resource.fetch().await
    }
}

/// Fields of the `ping/` response we care about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active_node: Option<String>,
    #[serde(default)]
    pub ha: bool,
}

#[derive(Clone)]
pub struct VersionProxy {
    resource: ResourceProxy,
}

impl VersionProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Version),
        }
    }

    pub async fn server(&self) -> Result<ServerVersion> {
        let ping = self.resource.fetch().await?;
        Ok(serde_json::from_value(ping)?)
    }

    pub fn client(&self) -> &'static str {
        CLIENT_VERSION
    }
}

/// Server settings, grouped by category slug (`system`, `jobs`, ...)
#[derive(Clone)]
pub struct SettingProxy {
    resource: ResourceProxy,
}

impl SettingProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Setting),
        }
    }

    /// Raw category listing; entries carry `slug`, `name` and `url` but no id
    pub async fn list(&self) -> Result<Value> {
        self.resource.client().get(self.resource.endpoint()).await
    }

    /// Category slugs
    pub async fn categories(&self) -> Result<Vec<String>> {
        let listing = self.list().await?;
        Ok(category_slugs(&listing))
    }

    pub async fn get(&self, category: &str) -> Result<Value> {
        let path = format!("{}/{}", self.resource.endpoint(), category);
        self.resource.client().get(&path).await.map_err(|e| {
            if e.is_not_found() {
                AwxError::not_found("Setting category", category)
            } else {
                e
            }
        })
    }
}

fn category_slugs(listing: &Value) -> Vec<String> {
    listing
        .get("results")
        .and_then(|r| r.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("slug").and_then(|s| s.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_version_from_ping() {
        let ping = json!({"ha": false, "version": "17.1.0", "active_node": "awx-1", "instances": []});
        let version: ServerVersion = serde_json::from_value(ping).unwrap();
        assert_eq!(version.version, "17.1.0");
        assert_eq!(version.active_node.as_deref(), Some("awx-1"));
        assert!(!version.ha);
    }

    #[test]
    fn test_category_slugs() {
        let listing = json!({
            "count": 2,
            "results": [
                {"url": "/api/v2/settings/all/", "slug": "all", "name": "All"},
                {"url": "/api/v2/settings/jobs/", "slug": "jobs", "name": "Jobs"}
            ]
        });
        assert_eq!(category_slugs(&listing), vec!["all", "jobs"]);
    }
}
