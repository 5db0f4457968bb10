//! Inventories

use super::organization::OrganizationProxy;
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct InventoryProxy {
    resource: ResourceProxy,
    organization: OrganizationProxy,
}

impl InventoryProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Inventory),
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

    /// Create an inventory inside an existing organization
    ///
    /// `variables` are sent as a JSON document string.
    pub async fn create(
        &self,
        name: &str,
        organization: &str,
        description: Option<&str>,
        variables: Option<&Map<String, Value>>,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let org = self.organization.get(organization).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        payload.insert("organization".into(), Value::from(org.id));
        if let Some(description) = description {
            payload.insert("description".into(), Value::from(description));
        }
        if let Some(variables) = variables {
            payload.insert("variables".into(), Value::from(serde_json::to_string(variables)?));
        }

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }
}
