//! Resource Fetcher
//!
//! Handles listing AWX collections: query building, single pages and
//! following `next` links across pages.

use crate::awx::AwxClient;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote entity: an integer id plus whatever fields the server returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    /// Build a resource from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// `name`, or `username` for users
    pub fn name(&self) -> Option<&str> {
        self.str_field("name").or_else(|| self.str_field("username"))
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    pub fn int_field(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(|v| v.as_i64())
    }

    /// Server-relative link from the `related` block
    pub fn related(&self, key: &str) -> Option<&str> {
        self.fields
            .get("related")
            .and_then(|r| r.get(key))
            .and_then(|v| v.as_str())
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("id".to_string(), Value::from(self.id));
        Value::Object(map)
    }
}

/// One page of a collection, passed through as the server sent it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Resource>,
}

/// Query-string filters for collection requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key=value` filter; a repeated key replaces the earlier value
    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if let Some(existing) = self.params.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.params.push((key.to_string(), value));
        }
        self
    }

    pub fn page_size(self, size: u32) -> Self {
        self.filter("page_size", size)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the query string to a URL
    pub fn apply(&self, url: &str) -> String {
        if self.params.is_empty() {
            url.to_string()
        } else if url.contains('?') {
            format!("{}&{}", url, self.to_query_string())
        } else {
            format!("{}?{}", url, self.to_query_string())
        }
    }

    /// Human readable form for error messages
    pub fn describe(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Fetch one page of a collection
pub async fn fetch_page(client: &AwxClient, endpoint: &str, query: &ListQuery) -> Result<ListPage> {
    let url = query.apply(&client.api_url(endpoint));
    let response = client.get_url(&url).await?;
    Ok(serde_json::from_value(response)?)
}

/// Fetch all results (auto-paginate)
pub async fn fetch_all(client: &AwxClient, endpoint: &str, query: &ListQuery) -> Result<Vec<Resource>> {
    let mut page = fetch_page(client, endpoint, query).await?;
    let mut all_items = std::mem::take(&mut page.results);

    while let Some(next) = page.next.take() {
        tracing::debug!("Following next page {}", next);
        let response = client.get_url(&client.absolute_url(&next)).await?;
        page = serde_json::from_value(response)?;
        all_items.append(&mut page.results);
    }

    Ok(all_items)
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = item;

    for part in parts {
        // Handle array index
        if let Ok(idx) = part.parse::<usize>() {
            current = match current.get(idx) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        } else {
            current = match current.get(part) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_encodes_values() {
        let query = ListQuery::new().filter("name", "my inventory").filter("organization", 3);
        assert_eq!(query.to_query_string(), "name=my%20inventory&organization=3");
        assert_eq!(query.apply("http://x/api/v2/inventories/"), "http://x/api/v2/inventories/?name=my%20inventory&organization=3");
    }

    #[test]
    fn test_query_filter_replaces_existing_key() {
        let query = ListQuery::new().filter("page", 1).filter("page", 2);
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.describe(), "page=2");
    }

    #[test]
    fn test_resource_accessors() {
        let resource = Resource::from_value(json!({
            "id": 7,
            "name": "demo",
            "organization": 2,
            "related": {"playbooks": "/api/v2/projects/7/playbooks/"}
        }))
        .unwrap();

        assert_eq!(resource.id, 7);
        assert_eq!(resource.name(), Some("demo"));
        assert_eq!(resource.int_field("organization"), Some(2));
        assert_eq!(resource.related("playbooks"), Some("/api/v2/projects/7/playbooks/"));
        assert_eq!(resource.to_value()["id"], 7);
    }

    #[test]
    fn test_list_page_passes_through() {
        let page: ListPage = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 1, "username": "admin"}]
        }))
        .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].name(), Some("admin"));
    }

    #[test]
    fn test_extract_json_value_paths() {
        let item = json!({"summary_fields": {"organization": {"name": "Carbon"}}, "hosts": [1, 2]});
        assert_eq!(extract_json_value(&item, "summary_fields.organization.name"), "Carbon");
        assert_eq!(extract_json_value(&item, "hosts"), "[2 items]");
        assert_eq!(extract_json_value(&item, "hosts.1"), "2");
        assert_eq!(extract_json_value(&item, "missing"), "-");
    }
}
