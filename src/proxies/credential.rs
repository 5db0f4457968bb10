//! Credentials
//!
//! Credential creation dispatches on [`CredentialKind`] through a
//! [`CredentialHandlers`] table. Each handler turns caller options into the
//! credential `inputs` payload before anything is sent to the server.

use super::organization::OrganizationProxy;
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Credential kinds, named after the AWX credential type `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialKind {
    Ssh,
    Scm,
    Vault,
    Net,
    Cloud,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Scm => "scm",
            Self::Vault => "vault",
            Self::Net => "net",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = AwxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "scm" => Ok(Self::Scm),
            "vault" => Ok(Self::Vault),
            "net" => Ok(Self::Net),
            "cloud" => Ok(Self::Cloud),
            other => Err(AwxError::validation(format!("Unknown credential kind {}", other))),
        }
    }
}

/// Builds the `inputs` payload from caller options
pub type CredentialInputBuilder = fn(&Map<String, Value>) -> Result<Map<String, Value>>;

/// Kind to input-builder table
#[derive(Clone)]
pub struct CredentialHandlers {
    handlers: HashMap<CredentialKind, CredentialInputBuilder>,
}

impl Default for CredentialHandlers {
    fn default() -> Self {
        let mut handlers = Self {
            handlers: HashMap::new(),
        };
        handlers.register(CredentialKind::Ssh, ssh_inputs);
        handlers
    }
}

impl CredentialHandlers {
    /// Register or replace the handler for a kind
    pub fn register(&mut self, kind: CredentialKind, builder: CredentialInputBuilder) {
        self.handlers.insert(kind, builder);
    }

    pub fn get(&self, kind: CredentialKind) -> Option<CredentialInputBuilder> {
        self.handlers.get(&kind).copied()
    }

    /// Kinds with a registered handler, sorted
    pub fn supported(&self) -> Vec<CredentialKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Parse a kind string and build its inputs
    pub fn build(&self, kind: &str, options: &Map<String, Value>) -> Result<(CredentialKind, Map<String, Value>)> {
        let parsed: CredentialKind = kind.parse()?;
        let Some(builder) = self.get(parsed) else {
            let supported = self
                .supported()
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AwxError::validation(format!(
                "Credential kind {} is not supported. Supported kinds: {}",
                parsed, supported
            )));
        };
        Ok((parsed, builder(options)?))
    }
}

/// Forwarded verbatim from options into ssh inputs when present
const SSH_OPTIONAL_INPUTS: &[&str] = &[
    "username",
    "password",
    "ssh_key_unlock",
    "become_method",
    "become_username",
    "become_password",
];

/// `ssh_key_data` names a private key file whose content is inlined
fn ssh_inputs(options: &Map<String, Value>) -> Result<Map<String, Value>> {
    let Some(key_path) = options.get("ssh_key_data").and_then(|v| v.as_str()) else {
        return Err(AwxError::validation("ssh credentials require ssh_key_data (a private key file path)"));
    };

    if !Path::new(key_path).exists() {
        return Err(AwxError::validation(format!("SSH private key {} not found.", key_path)));
    }

    let key_content = std::fs::read_to_string(key_path)?;

    let mut inputs = Map::new();
    inputs.insert("ssh_key_data".into(), Value::from(key_content));
    for key in SSH_OPTIONAL_INPUTS {
        if let Some(value) = options.get(*key).filter(|v| !v.is_null()) {
            inputs.insert((*key).to_string(), value.clone());
        }
    }

    Ok(inputs)
}

#[derive(Clone)]
pub struct CredentialProxy {
    resource: ResourceProxy,
    credential_types: ResourceProxy,
    organization: OrganizationProxy,
    handlers: CredentialHandlers,
}

impl CredentialProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Credential),
            credential_types: ResourceProxy::new(client, ResourceKind::CredentialType),
            organization: OrganizationProxy::new(client),
            handlers: CredentialHandlers::default(),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    /// Register an input builder for another credential kind
    pub fn register_handler(&mut self, kind: CredentialKind, builder: CredentialInputBuilder) {
        self.handlers.register(kind, builder);
    }

    pub fn supported_kinds(&self) -> Vec<CredentialKind> {
        self.handlers.supported()
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    pub async fn get(&self, name: &str) -> Result<Resource> {
        self.resource.get_by_name(name).await
    }

    /// Create a credential of `kind`
    ///
    /// Kind validation and input building (including reading key files) run
    /// before any request is made.
    pub async fn create(
        &self,
        name: &str,
        kind: &str,
        organization: &str,
        options: &Map<String, Value>,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let (kind, inputs) = self.handlers.build(kind, options)?;

        let org = self.organization.get(organization).await?;
        let credential_type = self.credential_type(kind).await?;

        let mut payload = Map::new();
        payload.insert("name".into(), Value::from(name));
        payload.insert("organization".into(), Value::from(org.id));
        payload.insert("credential_type".into(), Value::from(credential_type.id));
        if let Some(description) = options.get("description").and_then(|v| v.as_str()) {
            payload.insert("description".into(), Value::from(description));
        }
        payload.insert("inputs".into(), Value::Object(inputs));

        self.resource.create(payload, fail_on_found).await
    }

    /// Create an ssh credential from a private key file
    ///
    /// An existing credential of the same name is kept and returned.
    pub async fn create_ssh_credential(&self, name: &str, organization: &str, ssh_key_file: &str) -> Result<Resource> {
        let mut options = Map::new();
        options.insert("ssh_key_data".into(), Value::from(ssh_key_file));
        self.create(name, CredentialKind::Ssh.as_str(), organization, &options, false)
            .await
    }

    pub async fn delete(&self, name: &str, kind: &str) -> Result<bool> {
        let kind: CredentialKind = kind.parse()?;
        let credential_type = self.credential_type(kind).await?;
        self.resource
            .delete(
                &ListQuery::new()
                    .filter("name", name)
                    .filter("credential_type", credential_type.id),
            )
            .await
    }

    /// Built-in credential type for a kind (the first one the server lists)
    async fn credential_type(&self, kind: CredentialKind) -> Result<Resource> {
        let query = ListQuery::new().filter("kind", kind.as_str()).filter("order_by", "id");
        let page = self.credential_types.list_with(&query).await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| AwxError::not_found("Credential type", kind.as_str()))
    }
}
