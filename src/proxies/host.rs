//! Hosts
//!
//! Host names are only unique inside an inventory, so lookups scan the
//! inventory's host listing.

use super::group::GroupProxy;
use super::inventory::InventoryProxy;
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct HostProxy {
    resource: ResourceProxy,
    inventory: InventoryProxy,
    group: GroupProxy,
}

impl HostProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Host),
            inventory: InventoryProxy::new(client),
            group: GroupProxy::new(client),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    /// Find a host by name inside an inventory
    pub async fn get(&self, name: &str, inventory: &str) -> Result<Resource> {
        let inv = self.inventory.get(inventory).await?;
        self.resource
            .find_by_name(name, &ListQuery::new().filter("inventory", inv.id))
            .await
    }

    pub async fn create(
        &self,
        name: &str,
        inventory: &str,
        variables: Option<&Map<String, Value>>,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let inv = self.inventory.get(inventory).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        payload.insert("inventory".into(), Value::from(inv.id));
        if let Some(variables) = variables {
            payload.insert("variables".into(), Value::from(serde_json::to_string(variables)?));
        }

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str, inventory: &str) -> Result<bool> {
        let inv = self.inventory.get(inventory).await?;
        self.resource
            .delete(&ListQuery::new().filter("name", name).filter("inventory", inv.id))
            .await
    }

    /// Add a host to a group of the same inventory
    pub async fn associate(&self, name: &str, group: &str, inventory: &str) -> Result<()> {
        let host = self.get(name, inventory).await?;
        let group = self.group.get(group, inventory).await?;
        self.group.resource().associate(group.id, "hosts", host.id).await
    }

    pub async fn disassociate(&self, name: &str, group: &str, inventory: &str) -> Result<()> {
        let host = self.get(name, inventory).await?;
        let group = self.group.get(group, inventory).await?;
        self.group.resource().disassociate(group.id, "hosts", host.id).await
    }
}
