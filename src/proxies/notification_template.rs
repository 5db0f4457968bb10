//! Notification templates

use super::organization::OrganizationProxy;
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// `notification_configuration` given inline or as a JSON/YAML file
#[derive(Debug, Clone)]
pub enum NotificationConfig {
    Inline(Map<String, Value>),
    File(PathBuf),
}

impl NotificationConfig {
    pub fn load(&self) -> Result<Map<String, Value>> {
        match self {
            Self::Inline(map) => Ok(map.clone()),
            Self::File(path) => {
                if !path.exists() {
                    return Err(AwxError::validation(format!(
                        "Notification configuration {} not found.",
                        path.display()
                    )));
                }
                let content = std::fs::read_to_string(path)?;
                let value: Value = match serde_json::from_str(&content) {
                    Ok(value) => value,
                    Err(_) => serde_yaml::from_str(&content)?,
                };
                value.as_object().cloned().ok_or_else(|| {
                    AwxError::validation(format!(
                        "Notification configuration {} is not a mapping",
                        path.display()
                    ))
                })
            },
        }
    }
}

#[derive(Clone)]
pub struct NotificationTemplateProxy {
    resource: ResourceProxy,
    organization: OrganizationProxy,
}

impl NotificationTemplateProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::NotificationTemplate),
            organization: OrganizationProxy::new(client),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    pub async fn get(&self, name: &str) -> Result<Resource> {
        self.resource.get_by_name(name).await
    }

    /// Create a template of `notification_type` (`email`, `slack`, `webhook`, ...)
    pub async fn create(
        &self,
        name: &str,
        notification_type: &str,
        description: &str,
        organization: &str,
        configuration: Option<&NotificationConfig>,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let configuration = configuration.map(|c| c.load()).transpose()?;
        let org = self.organization.get(organization).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        payload.insert("description".into(), Value::from(description));
        payload.insert("notification_type".into(), Value::from(notification_type));
        payload.insert("organization".into(), Value::from(org.id));
        if let Some(configuration) = configuration {
            payload.insert("notification_configuration".into(), Value::Object(configuration));
        }

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inline_configuration() {
        let mut map = Map::new();
        map.insert("url".into(), Value::from("https://hooks.local/x"));
        let loaded = NotificationConfig::Inline(map.clone()).load().unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_yaml_file_configuration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channels:\n  - '#ops'\ntoken: abc").unwrap();

        let loaded = NotificationConfig::File(file.path().to_path_buf()).load().unwrap();
        assert_eq!(loaded["token"], "abc");
        assert_eq!(loaded["channels"][0], "#ops");
    }

    #[test]
    fn test_missing_file_fails() {
        let err = NotificationConfig::File("/nonexistent/notify.json".into())
            .load()
            .unwrap_err();
        assert!(matches!(err, AwxError::Validation(_)));
    }
}
