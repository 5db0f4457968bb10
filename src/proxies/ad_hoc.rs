//! Ad hoc commands

use super::credential::CredentialProxy;
use super::inventory::InventoryProxy;
use super::job::launched_id;
use super::unified_job::{JobState, UnifiedJobProxy};
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, ResourceKind};
use serde_json::{Map, Value};
use std::time::Duration;

/// A one-off module run against an inventory
#[derive(Debug, Clone)]
pub struct AdHocCommand {
    /// `run` or `check`
    pub job_type: String,
    pub module: String,
    pub module_args: String,
    pub inventory: String,
    pub credential: String,
    /// Host pattern; all hosts when unset
    pub limit: Option<String>,
}

impl AdHocCommand {
    pub fn new(module: &str, inventory: &str, credential: &str) -> Self {
        Self {
            job_type: "run".to_string(),
            module: module.to_string(),
            module_args: String::new(),
            inventory: inventory.to_string(),
            credential: credential.to_string(),
            limit: None,
        }
    }

    pub fn args(mut self, module_args: &str) -> Self {
        self.module_args = module_args.to_string();
        self
    }
}

#[derive(Clone)]
pub struct AdHocProxy {
    jobs: UnifiedJobProxy,
    credential: CredentialProxy,
    inventory: InventoryProxy,
}

impl AdHocProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            jobs: UnifiedJobProxy::new(client, ResourceKind::AdHoc),
            credential: CredentialProxy::new(client),
            inventory: InventoryProxy::new(client),
        }
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.jobs.list().await
    }

    /// Launch the command; returns the ad hoc command id
    pub async fn launch(&self, command: &AdHocCommand) -> Result<i64> {
        if command.module.trim().is_empty() {
            return Err(AwxError::validation("Ad hoc commands need a module name"));
        }

        let credential = self.credential.get(&command.credential).await?;
        let inventory = self.inventory.get(&command.inventory).await?;

        let mut body = Map::new();
        body.insert("job_type".into(), Value::from(command.job_type.as_str()));
        body.insert("module_name".into(), Value::from(command.module.as_str()));
        body.insert("module_args".into(), Value::from(command.module_args.as_str()));
        body.insert("inventory".into(), Value::from(inventory.id));
        body.insert("credential".into(), Value::from(credential.id));
        if let Some(limit) = &command.limit {
            body.insert("limit".into(), Value::from(limit.as_str()));
        }

        let resource = self.jobs.resource();
        let response = resource
            .client()
            .post(resource.endpoint(), Some(&Value::Object(body)))
            .await?;

        let id = launched_id(&response, "ad_hoc_command")?;
        tracing::info!("Launched ad hoc {} on {} as {}.", command.module, command.inventory, id);
        Ok(id)
    }

    pub async fn status(&self, id: i64) -> Result<JobState> {
        self.jobs.status(id).await
    }

    pub async fn stdout(&self, id: i64) -> Result<String> {
        self.jobs.stdout(id).await
    }

    pub async fn monitor(&self, id: i64, interval: Duration, timeout: Option<Duration>) -> Result<JobState> {
        self.jobs.monitor(id, interval, timeout).await
    }

    pub async fn cancel(&self, id: i64) -> Result<bool> {
        self.jobs.cancel(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awx::ConnectionSettings;

    #[test]
    fn test_command_defaults() {
        let command = AdHocCommand::new("ping", "uc01", "ssh").args("-v");
        assert_eq!(command.job_type, "run");
        assert_eq!(command.module_args, "-v");
        assert!(command.limit.is_none());
    }

    #[test]
    fn test_blank_module_rejected_before_any_request() {
        // Unroutable host: reaching the network would fail with an HTTP error
        let settings = ConnectionSettings::new("http://127.0.0.1:9", "admin", "pw").unwrap();
        let proxy = AdHocProxy::new(&AwxClient::new(settings).unwrap());

        let err = tokio_test::block_on(proxy.launch(&AdHocCommand::new(" ", "uc01", "ssh"))).unwrap_err();
        assert!(matches!(err, AwxError::Validation(_)));
    }
}
