//! Job templates

use super::credential::CredentialProxy;
use super::inventory::InventoryProxy;
use super::notification_template::NotificationTemplateProxy;
use super::project::ProjectProxy;
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Job outcomes a notification template can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Any,
    Success,
    Error,
}

impl NotificationEvent {
    /// Sub-resources of the job template to link into
    pub fn sub_resources(&self) -> &'static [&'static str] {
        match self {
            Self::Any => &["notification_templates_success", "notification_templates_error"],
            Self::Success => &["notification_templates_success"],
            Self::Error => &["notification_templates_error"],
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

impl FromStr for NotificationEvent {
    type Err = AwxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(AwxError::validation(format!(
                "Unknown notification status {}. Expected any, error or success",
                other
            ))),
        }
    }
}

/// Fields for a new job template; references are by name
#[derive(Debug, Clone)]
pub struct NewJobTemplate {
    pub name: String,
    pub description: String,
    /// `run` or `check`
    pub job_type: String,
    pub inventory: String,
    pub project: String,
    pub playbook: String,
    pub credential: String,
    /// Merged in order into one extra_vars document
    pub extra_vars: Vec<Map<String, Value>>,
    pub ask_variables_on_launch: bool,
    /// Host pattern, e.g. `web1,web2`
    pub limit: Option<String>,
}

impl NewJobTemplate {
    pub fn new(name: &str, inventory: &str, project: &str, playbook: &str, credential: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            job_type: "run".to_string(),
            inventory: inventory.to_string(),
            project: project.to_string(),
            playbook: playbook.to_string(),
            credential: credential.to_string(),
            extra_vars: Vec::new(),
            ask_variables_on_launch: false,
            limit: None,
        }
    }

    /// JSON document for the `extra_vars` field, `None` when empty
    pub fn extra_vars_document(&self) -> Result<Option<String>> {
        if self.extra_vars.is_empty() {
            return Ok(None);
        }
        let merged: Map<String, Value> = self
            .extra_vars
            .iter()
            .flat_map(|vars| vars.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();
        Ok(Some(serde_json::to_string(&merged)?))
    }
}

#[derive(Clone)]
pub struct JobTemplateProxy {
    resource: ResourceProxy,
    credential: CredentialProxy,
    inventory: InventoryProxy,
    project: ProjectProxy,
    notification_template: NotificationTemplateProxy,
}

impl JobTemplateProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::JobTemplate),
            credential: CredentialProxy::new(client),
            inventory: InventoryProxy::new(client),
            project: ProjectProxy::new(client),
            notification_template: NotificationTemplateProxy::new(client),
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

    /// Create a template, then attach its machine credential
    ///
    /// An existing template is returned as is, with no credential change.
    pub async fn create(&self, template: &NewJobTemplate, fail_on_found: bool) -> Result<Resource> {
        let credential = self.credential.get(&template.credential).await?;
        let inventory = self.inventory.get(&template.inventory).await?;
        let project = self.project.get(&template.project).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(template.name.as_str()));
        payload.insert("description".into(), Value::from(template.description.as_str()));
        payload.insert("job_type".into(), Value::from(template.job_type.as_str()));
        payload.insert("inventory".into(), Value::from(inventory.id));
        payload.insert("project".into(), Value::from(project.id));
        payload.insert("playbook".into(), Value::from(template.playbook.as_str()));
        payload.insert(
            "ask_variables_on_launch".into(),
            Value::from(template.ask_variables_on_launch),
        );
        if let Some(extra_vars) = template.extra_vars_document()? {
            payload.insert("extra_vars".into(), Value::from(extra_vars));
        }
        if let Some(limit) = &template.limit {
            payload.insert("limit".into(), Value::from(limit.as_str()));
        }

        let (template, created) = self.resource.create_or_get(payload, fail_on_found).await?;

        if created {
            self.resource.associate(template.id, "credentials", credential.id).await?;
        }

        Ok(template)
    }

    /// Delete a template of a given project
    pub async fn delete(&self, name: &str, project: &str) -> Result<bool> {
        let project = self.project.get(project).await?;
        self.resource
            .delete(&ListQuery::new().filter("name", name).filter("project", project.id))
            .await
    }

    pub async fn associate_notification_template(
        &self,
        job_template: &str,
        notification_template: &str,
        event: NotificationEvent,
    ) -> Result<()> {
        let template = self.get(job_template).await?;
        let notification = self.notification_template.get(notification_template).await?;

        for sub in event.sub_resources() {
            self.resource.associate(template.id, sub, notification.id).await?;
        }

        tracing::info!(
            "Notification template {} attached to {} on {}.",
            notification_template,
            job_template,
            event
        );
        Ok(())
    }

    pub async fn disassociate_notification_template(
        &self,
        job_template: &str,
        notification_template: &str,
        event: NotificationEvent,
    ) -> Result<()> {
        let template = self.get(job_template).await?;
        let notification = self.notification_template.get(notification_template).await?;

        for sub in event.sub_resources() {
            self.resource.disassociate(template.id, sub, notification.id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_event_expands_to_success_and_error() {
        assert_eq!(NotificationEvent::Any.sub_resources().len(), 2);
        assert_eq!(
            NotificationEvent::Error.sub_resources(),
            &["notification_templates_error"]
        );
        assert_eq!("SUCCESS".parse::<NotificationEvent>().unwrap(), NotificationEvent::Success);
        assert!("started".parse::<NotificationEvent>().is_err());
    }

    #[test]
    fn test_extra_vars_are_merged_in_order() {
        let mut template = NewJobTemplate::new("jt", "inv", "proj", "site.yml", "cred");
        assert_eq!(template.extra_vars_document().unwrap(), None);

        template.extra_vars = vec![
            json!({"a": 1, "b": 1}).as_object().cloned().unwrap(),
            json!({"b": 2}).as_object().cloned().unwrap(),
        ];
        let doc: Value = serde_json::from_str(&template.extra_vars_document().unwrap().unwrap()).unwrap();
        assert_eq!(doc, json!({"a": 1, "b": 2}));
    }
}
