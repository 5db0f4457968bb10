//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads the AWX resource definitions from an embedded JSON file
//! and provides lookup functions for the rest of the crate.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::AwxError;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/awx.json")];

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Collection path below `/api/v2/`
    pub endpoint: String,
    /// Field matched by name lookups (`username` for users)
    pub name_field: String,
    /// Payload fields that identify an existing resource on create
    #[serde(default)]
    pub identity: Vec<String>,
    /// Single object endpoint rather than a paged collection
    #[serde(default)]
    pub singleton: bool,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted (for CLI help and completion)
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

/// Every remote resource kind the client knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Organization,
    Inventory,
    Host,
    Group,
    Credential,
    CredentialType,
    Project,
    ProjectUpdate,
    JobTemplate,
    Job,
    Workflow,
    WorkflowJob,
    Node,
    Team,
    User,
    Role,
    Permission,
    NotificationTemplate,
    AdHoc,
    Label,
    Schedule,
    Setting,
    Config,
    Version,
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        Self::Organization,
        Self::Inventory,
        Self::Host,
        Self::Group,
        Self::Credential,
        Self::CredentialType,
        Self::Project,
        Self::ProjectUpdate,
        Self::JobTemplate,
        Self::Job,
        Self::Workflow,
        Self::WorkflowJob,
        Self::Node,
        Self::Team,
        Self::User,
        Self::Role,
        Self::Permission,
        Self::NotificationTemplate,
        Self::AdHoc,
        Self::Label,
        Self::Schedule,
        Self::Setting,
        Self::Config,
        Self::Version,
    ];

    /// Registry key
    pub fn key(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Inventory => "inventory",
            Self::Host => "host",
            Self::Group => "group",
            Self::Credential => "credential",
            Self::CredentialType => "credential_type",
            Self::Project => "project",
            Self::ProjectUpdate => "project_update",
            Self::JobTemplate => "job_template",
            Self::Job => "job",
            Self::Workflow => "workflow",
            Self::WorkflowJob => "workflow_job",
            Self::Node => "node",
            Self::Team => "team",
            Self::User => "user",
            Self::Role => "role",
            Self::Permission => "permission",
            Self::NotificationTemplate => "notification_template",
            Self::AdHoc => "ad_hoc",
            Self::Label => "label",
            Self::Schedule => "schedule",
            Self::Setting => "setting",
            Self::Config => "config",
            Self::Version => "version",
        }
    }

    /// Definition loaded from the embedded registry
    pub fn def(&self) -> &'static ResourceDef {
        get_resource(self.key())
            .unwrap_or_else(|| panic!("No resource definition for {}", self.key()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ResourceKind {
    type Err = AwxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| {
                AwxError::validation(format!(
                    "Unknown resource {}. Known resources: {}",
                    s,
                    get_all_resource_keys().join(", ")
                ))
            })
    }
}
