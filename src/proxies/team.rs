//! Teams

use super::organization::OrganizationProxy;
use super::user::UserProxy;
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{json, Map, Value};

#[derive(Clone)]
pub struct TeamProxy {
    resource: ResourceProxy,
    organization: OrganizationProxy,
    user: UserProxy,
}

impl TeamProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Team),
            organization: OrganizationProxy::new(client),
            user: UserProxy::new(client),
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

    pub async fn create(
        &self,
        name: &str,
        organization: &str,
        description: &str,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let org = self.organization.get(organization).await?;

        let payload: Map<String, Value> = json!({
            "name": name,
            "organization": org.id,
            "description": description,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }

    /// Add a user to the team
    pub async fn associate(&self, team: &str, username: &str) -> Result<()> {
        let user = self.user.get(username).await?;
        let team = self.get(team).await?;
        self.resource.associate(team.id, "users", user.id).await
    }

    pub async fn disassociate(&self, team: &str, username: &str) -> Result<()> {
        let user = self.user.get(username).await?;
        let team = self.get(team).await?;
        self.resource.disassociate(team.id, "users", user.id).await
    }
}
