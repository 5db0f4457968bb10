//! Projects
//!
//! Manual and SCM projects, project updates, and playbook discovery across
//! every project visible to the current user.

use super::organization::OrganizationProxy;
use super::unified_job::UnifiedJobProxy;
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// How many playbook listings are fetched at once
const PLAYBOOK_FETCH_CONCURRENCY: usize = 4;

/// Source control type of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScmType {
    Manual,
    Git,
    Hg,
    Svn,
}

impl ScmType {
    pub const ALL: &'static [ScmType] = &[Self::Manual, Self::Git, Self::Hg, Self::Svn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
        }
    }

    /// Value of the `scm_type` field; manual projects send an empty string
    pub fn api_value(&self) -> &'static str {
        match self {
            Self::Manual => "",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ScmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScmType {
    type Err = AwxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                AwxError::validation(format!("Unknown SCM type {}. Expected one of manual, git, hg, svn", s))
            })
    }
}

/// Settings for a project backed by version control
#[derive(Debug, Clone)]
pub struct ScmProject {
    pub name: String,
    pub description: String,
    pub organization: String,
    pub scm_type: ScmType,
    pub url: String,
    pub branch: String,
    /// Name of an scm credential
    pub credential: Option<String>,
    pub clean: bool,
    pub delete_on_update: bool,
    pub update_on_launch: bool,
    pub update_cache_timeout: u32,
}

impl ScmProject {
    pub fn new(name: &str, organization: &str, scm_type: ScmType, url: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            organization: organization.to_string(),
            scm_type,
            url: url.to_string(),
            branch: "master".to_string(),
            credential: None,
            clean: false,
            delete_on_update: false,
            update_on_launch: false,
            update_cache_timeout: 0,
        }
    }
}

/// Playbooks offered by one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPlaybooks {
    pub project: String,
    pub playbooks: Vec<String>,
}

/// First project (in listing order) offering `playbook`
///
/// An entry matches when it equals `playbook` or ends with `/playbook`, so
/// `system-release.yml` finds `playbooks/system-release.yml`.
pub fn find_playbook_project<'a>(index: &'a [ProjectPlaybooks], playbook: &str) -> Option<&'a str> {
    let suffix = format!("/{}", playbook.trim_start_matches('/'));
    index
        .iter()
        .find(|entry| {
            entry
                .playbooks
                .iter()
                .any(|p| p == playbook || p.ends_with(&suffix))
        })
        .map(|entry| entry.project.as_str())
}

#[derive(Clone)]
pub struct ProjectProxy {
    resource: ResourceProxy,
    organization: OrganizationProxy,
    credential: ResourceProxy,
    updates: UnifiedJobProxy,
}

impl ProjectProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Project),
            organization: OrganizationProxy::new(client),
            credential: ResourceProxy::new(client, ResourceKind::Credential),
            updates: UnifiedJobProxy::new(client, ResourceKind::ProjectUpdate),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    /// Project update jobs (status, stdout, monitor, cancel)
    pub fn updates(&self) -> &UnifiedJobProxy {
        &self.updates
    }

    pub fn scm_types(&self) -> &'static [ScmType] {
        ScmType::ALL
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    pub async fn get(&self, name: &str) -> Result<Resource> {
        self.resource.get_by_name(name).await
    }

    pub async fn create_scm_project(&self, project: &ScmProject, fail_on_found: bool) -> Result<Resource> {
        if project.scm_type == ScmType::Manual {
            return Err(AwxError::validation("SCM projects need a git, hg or svn scm_type"));
        }
        if project.url.trim().is_empty() {
            return Err(AwxError::validation(format!("Project {} needs an SCM url", project.name)));
        }

        let org = self.organization.get(&project.organization).await?;
        let credential = match &project.credential {
            Some(name) => Some(self.credential.get_by_name(name).await?.id),
            None => None,
        };

        let payload: Map<String, Value> = json!({
            "name": project.name,
            "description": project.description,
            "organization": org.id,
            "scm_type": project.scm_type.api_value(),
            "scm_url": project.url,
            "scm_branch": project.branch,
            "credential": credential,
            "scm_clean": project.clean,
            "scm_delete_on_update": project.delete_on_update,
            "scm_update_on_launch": project.update_on_launch,
            "scm_update_cache_timeout": project.update_cache_timeout,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn create_manual_project(
        &self,
        name: &str,
        description: &str,
        organization: &str,
        fail_on_found: bool,
    ) -> Result<Resource> {
        let org = self.organization.get(organization).await?;

        let payload: Map<String, Value> = json!({
            "name": name,
            "description": description,
            "organization": org.id,
            "scm_type": ScmType::Manual.api_value(),
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }

    /// Start an SCM update; returns the project update job id
    pub async fn update(&self, name: &str) -> Result<i64> {
        let project = self.get(name).await?;
        let response = self.resource.post_action(project.id, "update", None).await?;

        let update_id = response
            .get("project_update")
            .or_else(|| response.get("id"))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| AwxError::validation(format!("Project {} did not start an update", name)))?;

        tracing::info!("Project {} update {} started.", name, update_id);
        Ok(update_id)
    }

    /// Playbooks of every project, in project listing order
    ///
    /// One extra request per project; nothing is cached between calls.
    pub async fn playbooks(&self) -> Result<Vec<ProjectPlaybooks>> {
        let projects = self.resource.list_all(&ListQuery::new()).await?;
        let client = self.resource.client().clone();

        stream::iter(projects)
            .map(|project| {
                let client = client.clone();
                async move { fetch_project_playbooks(&client, project).await }
            })
            .buffered(PLAYBOOK_FETCH_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Name of the first project offering `playbook`, if any
    pub async fn get_playbook_project(&self, playbook: &str) -> Result<Option<String>> {
        let index = self.playbooks().await?;
        Ok(find_playbook_project(&index, playbook).map(|s| s.to_string()))
    }
}

async fn fetch_project_playbooks(client: &AwxClient, project: Resource) -> Result<ProjectPlaybooks> {
    let name = project.name().unwrap_or("-").to_string();

    let Some(link) = project.related("playbooks") else {
        tracing::warn!("Project {} has no playbooks link", name);
        return Ok(ProjectPlaybooks {
            project: name,
            playbooks: Vec::new(),
        });
    };

    let response = client.get_url(&client.absolute_url(link)).await?;
    let playbooks = response
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(ProjectPlaybooks {
        project: name,
        playbooks,
    })
}
