//! Role grants
//!
//! A grant links a user or team to one object role (`use`, `admin`, ...) of
//! a credential, inventory or project.

use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{fetcher, ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};

pub const DEFAULT_ROLE: &str = "use";

/// Who receives the role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    User(String),
    Team(String),
}

impl Grantee {
    fn kind(&self) -> ResourceKind {
        match self {
            Self::User(_) => ResourceKind::User,
            Self::Team(_) => ResourceKind::Team,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::User(name) | Self::Team(name) => name,
        }
    }
}

/// Object the role belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTarget {
    pub kind: ResourceKind,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RoleRequest {
    pub grantee: Grantee,
    /// Role name, e.g. `use`, `admin`, `read`, `execute`
    pub role: String,
    pub credential: Option<String>,
    pub inventory: Option<String>,
    pub project: Option<String>,
    pub fail_on_found: bool,
}

impl RoleRequest {
    pub fn new(grantee: Grantee) -> Self {
        Self {
            grantee,
            role: DEFAULT_ROLE.to_string(),
            credential: None,
            inventory: None,
            project: None,
            fail_on_found: true,
        }
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn credential(mut self, name: &str) -> Self {
        self.credential = Some(name.to_string());
        self
    }

    pub fn inventory(mut self, name: &str) -> Self {
        self.inventory = Some(name.to_string());
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.project = Some(name.to_string());
        self
    }

    pub fn fail_on_found(mut self, fail_on_found: bool) -> Self {
        self.fail_on_found = fail_on_found;
        self
    }

    /// The first non-empty of credential, inventory, project
    pub fn target(&self) -> Result<RoleTarget> {
        let candidates = [
            (ResourceKind::Credential, &self.credential),
            (ResourceKind::Inventory, &self.inventory),
            (ResourceKind::Project, &self.project),
        ];

        candidates
            .into_iter()
            .find_map(|(kind, name)| {
                name.as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .map(|n| RoleTarget {
                        kind,
                        name: n.to_string(),
                    })
            })
            .ok_or_else(|| AwxError::validation("Set a resource type to associate the role"))
    }
}

/// Role names compare case-insensitively, ignoring spaces and underscores
pub fn normalize_role_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

struct ResolvedGrant {
    grantee: ResourceProxy,
    grantee_id: i64,
    role: Resource,
}

#[derive(Clone)]
pub struct RoleProxy {
    resource: ResourceProxy,
    client: AwxClient,
}

impl RoleProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Role),
            client: client.clone(),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    /// Grant a role; returns `false` when it was already held and
    /// `fail_on_found` is off
    pub async fn grant(&self, request: &RoleRequest) -> Result<bool> {
        let resolved = self.resolve(request).await?;
        let label = format!("{} of {}", request.role, resolved.role.id);

        if self.holds(&resolved).await? {
            if request.fail_on_found {
                tracing::error!("{} already holds role {}!", request.grantee.name(), label);
                return Err(AwxError::found("Role", format!("{} for {}", label, request.grantee.name())));
            }
            tracing::info!("{} already holds role {}.", request.grantee.name(), label);
            return Ok(false);
        }

        resolved
            .grantee
            .associate(resolved.grantee_id, "roles", resolved.role.id)
            .await?;
        tracing::info!("Granted role {} to {}.", label, request.grantee.name());
        Ok(true)
    }

    /// Revoke a role; returns `false` when it was not held
    pub async fn revoke(&self, request: &RoleRequest) -> Result<bool> {
        let resolved = self.resolve(request).await?;
        let label = format!("{} of {}", request.role, resolved.role.id);

        if !self.holds(&resolved).await? {
            tracing::warn!("{} does not hold role {}, nothing to revoke.", request.grantee.name(), label);
            return Ok(false);
        }

        resolved
            .grantee
            .disassociate(resolved.grantee_id, "roles", resolved.role.id)
            .await?;
        tracing::info!("Revoked role {} from {}.", label, request.grantee.name());
        Ok(true)
    }

    /// Validate the request, then look up the grantee and the role
    async fn resolve(&self, request: &RoleRequest) -> Result<ResolvedGrant> {
        let target = request.target()?;

        let grantee = ResourceProxy::new(&self.client, request.grantee.kind());
        let grantee_id = grantee.get_by_name(request.grantee.name()).await?.id;

        let object = ResourceProxy::new(&self.client, target.kind)
            .get_by_name(&target.name)
            .await?;
        let role = self.object_role(target.kind, object.id, &request.role).await?;

        Ok(ResolvedGrant {
            grantee,
            grantee_id,
            role,
        })
    }

    async fn holds(&self, resolved: &ResolvedGrant) -> Result<bool> {
        let path = resolved.grantee.item_path(resolved.grantee_id, Some("roles"));
        let query = ListQuery::new().filter("id", resolved.role.id);
        let page = fetcher::fetch_page(&self.client, &path, &query).await?;
        Ok(page.count > 0 || !page.results.is_empty())
    }

    /// Role of an object by (normalized) role name
    async fn object_role(&self, kind: ResourceKind, object_id: i64, role: &str) -> Result<Resource> {
        let path = format!("{}/{}/object_roles", kind.def().endpoint, object_id);
        let wanted = normalize_role_name(role);

        fetcher::fetch_all(&self.client, &path, &ListQuery::new())
            .await?
            .into_iter()
            .find(|r| r.name().map(normalize_role_name).as_deref() == Some(wanted.as_str()))
            .ok_or_else(|| AwxError::not_found("Role", format!("{} on {} {}", role, kind, object_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_requires_a_resource() {
        let request = RoleRequest::new(Grantee::User("kingbob".into()));
        let err = request.target().unwrap_err();
        assert!(err.to_string().contains("Set a resource type"));

        let blank = RoleRequest::new(Grantee::User("kingbob".into())).project("  ");
        assert!(blank.target().is_err());
    }

    #[test]
    fn test_target_prefers_credential_then_inventory_then_project() {
        let request = RoleRequest::new(Grantee::User("u".into()))
            .project("p")
            .inventory("i")
            .credential("c");
        assert_eq!(request.target().unwrap().kind, ResourceKind::Credential);

        let request = RoleRequest::new(Grantee::Team("t".into())).project("p").inventory("i");
        assert_eq!(
            request.target().unwrap(),
            RoleTarget {
                kind: ResourceKind::Inventory,
                name: "i".into()
            }
        );
    }

    #[test]
    fn test_default_role_is_use() {
        let request = RoleRequest::new(Grantee::User("u".into()));
        assert_eq!(request.role, "use");
        assert!(request.fail_on_found);
    }

    #[test]
    fn test_role_name_normalization() {
        assert_eq!(normalize_role_name("Ad Hoc"), "adhoc");
        assert_eq!(normalize_role_name("ad_hoc"), "adhoc");
        assert_eq!(normalize_role_name("Use"), normalize_role_name("use"));
    }
}
