//! Facade
//!
//! [`Awx`] builds one [`AwxClient`] and hands a clone to one proxy per
//! resource kind.

use crate::awx::{AwxClient, ConnectionSettings, SettingsOverrides};
use crate::config::Config;
use crate::error::Result;
use crate::proxies::{
    AdHocProxy, ConfigProxy, CredentialProxy, GroupProxy, HostProxy, InventoryProxy, JobProxy, JobTemplateProxy,
    NotificationTemplateProxy, OrganizationProxy, ProjectProxy, RoleProxy, SettingProxy, TeamProxy, UserProxy,
    VersionProxy, WorkflowJobProxy, WorkflowProxy,
};
use crate::resource::{ResourceKind, ResourceProxy};

/// Every resource proxy, sharing one connection
#[derive(Clone)]
pub struct Awx {
    client: AwxClient,
    pub ad_hoc: AdHocProxy,
    pub config: ConfigProxy,
    pub credential: CredentialProxy,
    pub group: GroupProxy,
    pub host: HostProxy,
    pub inventory: InventoryProxy,
    pub job: JobProxy,
    pub job_template: JobTemplateProxy,
    pub label: ResourceProxy,
    pub node: ResourceProxy,
    pub notification_template: NotificationTemplateProxy,
    pub organization: OrganizationProxy,
    pub permission: ResourceProxy,
    pub project: ProjectProxy,
    pub role: RoleProxy,
    pub schedule: ResourceProxy,
    pub setting: SettingProxy,
    pub team: TeamProxy,
    pub user: UserProxy,
    pub version: VersionProxy,
    pub workflow: WorkflowProxy,
    pub workflow_job: WorkflowJobProxy,
}

impl Awx {
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        tracing::debug!("Connecting to {} as {}", settings.host, settings.username);
        let client = AwxClient::new(settings)?;
        Ok(Self::with_client(client))
    }

    /// Settings from the environment, tower-cli files and the config file
    pub fn from_env() -> Result<Self> {
        let settings = ConnectionSettings::resolve(SettingsOverrides::default(), &Config::load())?;
        Self::new(settings)
    }

    pub fn with_client(client: AwxClient) -> Self {
        Self {
            ad_hoc: AdHocProxy::new(&client),
            config: ConfigProxy::new(&client),
            credential: CredentialProxy::new(&client),
            group: GroupProxy::new(&client),
            host: HostProxy::new(&client),
            inventory: InventoryProxy::new(&client),
            job: JobProxy::new(&client),
            job_template: JobTemplateProxy::new(&client),
            label: ResourceProxy::new(&client, ResourceKind::Label),
            node: ResourceProxy::new(&client, ResourceKind::Node),
            notification_template: NotificationTemplateProxy::new(&client),
            organization: OrganizationProxy::new(&client),
            permission: ResourceProxy::new(&client, ResourceKind::Permission),
            project: ProjectProxy::new(&client),
            role: RoleProxy::new(&client),
            schedule: ResourceProxy::new(&client, ResourceKind::Schedule),
            setting: SettingProxy::new(&client),
            team: TeamProxy::new(&client),
            user: UserProxy::new(&client),
            version: VersionProxy::new(&client),
            workflow: WorkflowProxy::new(&client),
            workflow_job: WorkflowJobProxy::new(&client),
            client,
        }
    }

    pub fn client(&self) -> &AwxClient {
        &self.client
    }

    /// Generic proxy for any kind, for callers that pick the kind at runtime
    pub fn resource(&self, kind: ResourceKind) -> ResourceProxy {
        ResourceProxy::new(&self.client, kind)
    }
}
