//! Users

use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{json, Map, Value};

/// Fields for a new user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub superuser: bool,
    pub system_auditor: bool,
}

impl NewUser {
    fn payload(&self) -> Map<String, Value> {
        let value = json!({
            "username": self.username,
            "password": self.password,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "is_superuser": self.superuser,
            "is_system_auditor": self.system_auditor,
        });
        value.as_object().cloned().unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct UserProxy {
    resource: ResourceProxy,
}

impl UserProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::User),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    /// Look up a user by username
    pub async fn get(&self, username: &str) -> Result<Resource> {
        self.resource.get_by_name(username).await
    }

    pub async fn create(&self, user: &NewUser, fail_on_found: bool) -> Result<Resource> {
        self.resource.create(user.payload(), fail_on_found).await
    }

    pub async fn delete(&self, username: &str) -> Result<bool> {
        self.resource
            .delete(&ListQuery::new().filter("username", username))
            .await
    }
}
