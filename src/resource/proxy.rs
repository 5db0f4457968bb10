//! Resource Proxy
//!
//! Generic accessor for one AWX collection. Every per-kind proxy in
//! [`crate::proxies`] is built on top of one of these.

use super::fetcher::{self, ListPage, ListQuery, Resource};
use super::registry::{ResourceDef, ResourceKind};
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use serde_json::{json, Map, Value};

#[derive(Clone)]
pub struct ResourceProxy {
    client: AwxClient,
    kind: ResourceKind,
    def: &'static ResourceDef,
}

impl ResourceProxy {
    pub fn new(client: &AwxClient, kind: ResourceKind) -> Self {
        Self {
            client: client.clone(),
            kind,
            def: kind.def(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Registry key of the bound resource
    pub fn name(&self) -> &'static str {
        self.kind.key()
    }

    pub fn display_name(&self) -> &str {
        &self.def.display_name
    }

    pub fn endpoint(&self) -> &str {
        &self.def.endpoint
    }

    pub fn client(&self) -> &AwxClient {
        &self.client
    }

    /// API path of one item, optionally with a sub-resource
    pub fn item_path(&self, id: i64, sub: Option<&str>) -> String {
        match sub {
            Some(sub) => format!("{}/{}/{}", self.def.endpoint, id, sub.trim_matches('/')),
            None => format!("{}/{}", self.def.endpoint, id),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// First page of the collection, unmodified
    pub async fn list(&self) -> Result<ListPage> {
        self.list_with(&ListQuery::new()).await
    }

    pub async fn list_with(&self, query: &ListQuery) -> Result<ListPage> {
        fetcher::fetch_page(&self.client, &self.def.endpoint, query).await
    }

    /// Every matching result across all pages
    pub async fn list_all(&self, query: &ListQuery) -> Result<Vec<Resource>> {
        fetcher::fetch_all(&self.client, &self.def.endpoint, query).await
    }

    /// Fetch a singleton endpoint such as `config/` or `ping/`
    pub async fn fetch(&self) -> Result<Value> {
        self.client.get(&self.def.endpoint).await
    }

    /// Server-side filtered lookup that must match exactly one resource
    pub async fn get(&self, query: &ListQuery) -> Result<Resource> {
        let mut page = self.list_with(query).await?;

        match page.results.len() {
            0 => Err(self.not_found(query)),
            1 => Ok(page.results.remove(0)),
            _ => Err(AwxError::MultipleFound {
                kind: self.def.display_name.clone(),
                query: query.describe(),
            }),
        }
    }

    /// Server-side lookup on the name field
    pub async fn get_by_name(&self, name: &str) -> Result<Resource> {
        self.get(&ListQuery::new().filter(&self.def.name_field, name)).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Resource> {
        let value = self.client.get(&self.item_path(id, None)).await.map_err(|e| {
            if e.is_not_found() {
                AwxError::not_found(&self.def.display_name, id.to_string())
            } else {
                e
            }
        })?;
        Resource::from_value(value)
    }

    /// Linear scan of `scope` for the first resource whose name matches
    ///
    /// Used where the server has no unique name index; duplicates beyond the
    /// first match are ignored.
    pub async fn find_by_name(&self, name: &str, scope: &ListQuery) -> Result<Resource> {
        let items = self.list_all(scope).await?;
        find_first_named(items, &self.def.name_field, name)
            .ok_or_else(|| AwxError::not_found(&self.def.display_name, name))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a resource
    ///
    /// The identity fields of the payload are looked up first. An existing
    /// match fails with [`AwxError::Found`] when `fail_on_found` is set and is
    /// returned unchanged otherwise.
    pub async fn create(&self, payload: Map<String, Value>, fail_on_found: bool) -> Result<Resource> {
        self.create_or_get(payload, fail_on_found)
            .await
            .map(|(resource, _)| resource)
    }

    /// Same as [`Self::create`], also reporting whether a POST was made
    pub async fn create_or_get(
        &self,
        payload: Map<String, Value>,
        fail_on_found: bool,
    ) -> Result<(Resource, bool)> {
        let payload = strip_nulls(payload);
        let label = self.payload_label(&payload);

        tracing::info!("Creating {} {}.", self.def.display_name, label);

        if let Some(query) = self.identity_query(&payload) {
            let page = self.list_with(&query).await?;
            if let Some(existing) = page.results.into_iter().next() {
                if fail_on_found {
                    tracing::error!("{} {} already exists!", self.def.display_name, label);
                    return Err(AwxError::found(&self.def.display_name, label));
                }
                tracing::info!("{} {} already exists, keeping id {}.", self.def.display_name, label, existing.id);
                return Ok((existing, false));
            }
        }

        let body = Value::Object(payload);
        let response = match self.client.post(&self.def.endpoint, Some(&body)).await {
            Ok(response) => response,
            Err(e) if e.is_found() => {
                tracing::error!("{} {} already exists!", self.def.display_name, label);
                return Err(AwxError::found(&self.def.display_name, label));
            },
            Err(e) => {
                tracing::error!("Failed to create {} {}: {}", self.def.display_name, label, e);
                return Err(e);
            },
        };

        let created = Resource::from_value(response)?;
        tracing::info!("{} {} successfully created!", self.def.display_name, label);
        Ok((created, true))
    }

    /// Resolve and delete a resource; `Ok(false)` when it was already absent
    pub async fn delete(&self, query: &ListQuery) -> Result<bool> {
        let label = query
            .get(&self.def.name_field)
            .map(|s| s.to_string())
            .unwrap_or_else(|| query.describe());

        tracing::info!("Deleting {} {}.", self.def.display_name, label);

        let resource = match self.get(query).await {
            Ok(resource) => resource,
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {} does not exist, nothing to delete.", self.def.display_name, label);
                return Ok(false);
            },
            Err(e) => return Err(e),
        };

        self.delete_by_id(resource.id).await?;
        tracing::info!("{} {} successfully deleted!", self.def.display_name, label);
        Ok(true)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.client.delete(&self.item_path(id, None)).await?;
        Ok(())
    }

    /// Link `other_id` into the `sub` collection of item `id`
    pub async fn associate(&self, id: i64, sub: &str, other_id: i64) -> Result<()> {
        tracing::debug!("Associating {} with {} {}/{}", other_id, self.name(), id, sub);
        let body = json!({ "id": other_id });
        self.client.post(&self.item_path(id, Some(sub)), Some(&body)).await?;
        Ok(())
    }

    /// Remove `other_id` from the `sub` collection of item `id`
    pub async fn disassociate(&self, id: i64, sub: &str, other_id: i64) -> Result<()> {
        tracing::debug!("Disassociating {} from {} {}/{}", other_id, self.name(), id, sub);
        let body = json!({ "id": other_id, "disassociate": true });
        self.client.post(&self.item_path(id, Some(sub)), Some(&body)).await?;
        Ok(())
    }

    /// POST to an item action such as `launch/`, `cancel/` or `update/`
    pub async fn post_action(&self, id: i64, action: &str, body: Option<&Value>) -> Result<Value> {
        self.client.post(&self.item_path(id, Some(action)), body).await
    }

    /// GET an item sub-resource
    pub async fn get_sub(&self, id: i64, sub: &str) -> Result<Value> {
        self.client.get(&self.item_path(id, Some(sub))).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn not_found(&self, query: &ListQuery) -> AwxError {
        let name = query
            .get(&self.def.name_field)
            .map(|s| s.to_string())
            .unwrap_or_else(|| query.describe());
        AwxError::not_found(&self.def.display_name, name)
    }

    fn payload_label(&self, payload: &Map<String, Value>) -> String {
        payload
            .get(&self.def.name_field)
            .and_then(|v| v.as_str())
            .unwrap_or("-")
            .to_string()
    }

    /// Filters that identify the payload, or `None` when the kind has no
    /// identity or the payload lacks its name
    fn identity_query(&self, payload: &Map<String, Value>) -> Option<ListQuery> {
        if self.def.identity.is_empty() || !payload.contains_key(&self.def.name_field) {
            return None;
        }

        let mut query = ListQuery::new();
        for field in &self.def.identity {
            match payload.get(field) {
                Some(Value::String(s)) => query = query.filter(field, s),
                Some(Value::Number(n)) => query = query.filter(field, n),
                Some(Value::Bool(b)) => query = query.filter(field, b),
                _ => {},
            }
        }
        Some(query)
    }
}

/// First item whose `name_field` equals `name`
pub fn find_first_named(items: Vec<Resource>, name_field: &str, name: &str) -> Option<Resource> {
    items
        .into_iter()
        .find(|item| item.str_field(name_field) == Some(name))
}

/// Drop `null` entries; AWX rejects explicit nulls on many fields
pub fn strip_nulls(payload: Map<String, Value>) -> Map<String, Value> {
    payload.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awx::ConnectionSettings;

    fn proxy(kind: ResourceKind) -> ResourceProxy {
        let settings = ConnectionSettings::new("http://awx.local", "admin", "pw").unwrap();
        ResourceProxy::new(&AwxClient::new(settings).unwrap(), kind)
    }

    fn item(id: i64, name: &str) -> Resource {
        Resource::from_value(json!({"id": id, "name": name})).unwrap()
    }

    #[test]
    fn test_first_match_wins_on_duplicates() {
        let items = vec![item(1, "a"), item(2, "dup"), item(3, "dup")];
        assert_eq!(find_first_named(items, "name", "dup").map(|r| r.id), Some(2));
    }

    #[test]
    fn test_missing_name_yields_none() {
        assert!(find_first_named(vec![item(1, "a")], "name", "b").is_none());
    }

    #[test]
    fn test_strip_nulls() {
        let payload = json!({"name": "x", "description": null}).as_object().cloned().unwrap();
        let stripped = strip_nulls(payload);
        assert!(stripped.contains_key("name"));
        assert!(!stripped.contains_key("description"));
    }

    #[test]
    fn test_identity_query_uses_scoped_fields() {
        let hosts = proxy(ResourceKind::Host);
        let payload = json!({"name": "localhost", "inventory": 4, "variables": "{}"})
            .as_object()
            .cloned()
            .unwrap();
        let query = hosts.identity_query(&payload).unwrap();
        assert_eq!(query.to_query_string(), "name=localhost&inventory=4");
    }

    #[test]
    fn test_identity_query_skipped_without_identity() {
        let jobs = proxy(ResourceKind::AdHoc);
        let payload = json!({"module_name": "ping"}).as_object().cloned().unwrap();
        assert!(jobs.identity_query(&payload).is_none());
    }

    #[test]
    fn test_item_path() {
        let orgs = proxy(ResourceKind::Organization);
        assert_eq!(orgs.item_path(3, None), "organizations/3");
        assert_eq!(orgs.item_path(3, Some("/users/")), "organizations/3/users");
    }
}
