//! Organizations
//!
//! The server has no unique name filter we rely on for organizations, so
//! [`OrganizationProxy::get`] scans the listing.

use super::user::UserProxy;
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct OrganizationProxy {
    resource: ResourceProxy,
    user: UserProxy,
}

impl OrganizationProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Organization),
            user: UserProxy::new(client),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    /// Find an organization by name (first match wins)
    pub async fn get(&self, name: &str) -> Result<Resource> {
        self.resource.find_by_name(name, &ListQuery::new()).await
    }

    pub async fn create(&self, name: &str, description: Option<&str>, fail_on_found: bool) -> Result<Resource> {
        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        if let Some(description) = description {
            payload.insert("description".into(), Value::from(description));
        }
        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }

    /// Add a user as a member of the organization
    pub async fn associate(&self, organization: &str, username: &str) -> Result<()> {
        let (org_id, user_id) = self.resolve(organization, username).await?;
        self.resource.associate(org_id, "users", user_id).await
    }

    pub async fn disassociate(&self, organization: &str, username: &str) -> Result<()> {
        let (org_id, user_id) = self.resolve(organization, username).await?;
        self.resource.disassociate(org_id, "users", user_id).await
    }

    /// Make a user an administrator of the organization
    pub async fn associate_admin(&self, organization: &str, username: &str) -> Result<()> {
        let (org_id, user_id) = self.resolve(organization, username).await?;
        self.resource.associate(org_id, "admins", user_id).await
    }

    pub async fn disassociate_admin(&self, organization: &str, username: &str) -> Result<()> {
        let (org_id, user_id) = self.resolve(organization, username).await?;
        self.resource.disassociate(org_id, "admins", user_id).await
    }

    async fn resolve(&self, organization: &str, username: &str) -> Result<(i64, i64)> {
        let user = self.user.get(username).await?;
        let org = self.get(organization).await?;
        Ok((org.id, user.id))
    }
}
