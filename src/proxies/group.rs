//! Inventory groups

use super::inventory::InventoryProxy;
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct GroupProxy {
    resource: ResourceProxy,
    inventory: InventoryProxy,
}

impl GroupProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Group),
            inventory: InventoryProxy::new(client),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    /// Find a group by name inside an inventory (first match wins)
    pub async fn get(&self, name: &str, inventory: &str) -> Result<Resource> {
        let inv = self.inventory.get(inventory).await?;
        self.resource
            .find_by_name(name, &ListQuery::new().filter("inventory", inv.id))
            .await
    }

    pub async fn create(&self, name: &str, inventory: &str, fail_on_found: bool) -> Result<Resource> {
        let inv = self.inventory.get(inventory).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        payload.insert("inventory".into(), Value::from(inv.id));

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str, inventory: &str) -> Result<bool> {
        let inv = self.inventory.get(inventory).await?;
        self.resource
            .delete(&ListQuery::new().filter("name", name).filter("inventory", inv.id))
            .await
    }
}
