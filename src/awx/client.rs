//! AWX Client
//!
//! Main client for the AWX REST API, combining connection settings and
//! HTTP functionality. Cheap to clone; every proxy holds its own copy.

use super::http::AwxHttpClient;
use super::settings::ConnectionSettings;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;

/// Main AWX client
#[derive(Clone)]
pub struct AwxClient {
    settings: Arc<ConnectionSettings>,
    pub http: AwxHttpClient,
}

impl AwxClient {
    /// Create a new AWX client
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        let http = AwxHttpClient::new(&settings)?;

        Ok(Self {
            settings: Arc::new(settings),
            http,
        })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn host(&self) -> &str {
        &self.settings.host
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a versioned API URL; AWX wants a trailing slash on every path
    pub fn api_url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}/", self.settings.api_base())
        } else {
            format!("{}/{}/", self.settings.api_base(), path)
        }
    }

    /// Resolve a server-relative link (`related.*`, `next`) against the host
    pub fn absolute_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else if link.starts_with('/') {
            format!("{}{}", self.settings.host, link)
        } else {
            format!("{}/{}", self.settings.host, link)
        }
    }

    // =========================================================================
    // Requests against API paths
    // =========================================================================

    /// GET an API path
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.http.get_json(&self.api_url(path)).await
    }

    /// GET a full URL (already carrying any query string)
    pub async fn get_url(&self, url: &str) -> Result<Value> {
        self.http.get_json(url).await
    }

    /// GET an API path as text
    pub async fn get_text(&self, path: &str, query: &str) -> Result<String> {
        let mut url = self.api_url(path);
        if !query.is_empty() {
            url = format!("{}?{}", url, query);
        }
        self.http.get_text(&url).await
    }

    /// POST to an API path
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.http.post_json(&self.api_url(path), body).await
    }

    /// DELETE an API path
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.http.delete(&self.api_url(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AwxClient {
        let settings = ConnectionSettings::new("http://awx.local/", "admin", "pw").unwrap();
        AwxClient::new(settings).unwrap()
    }

    #[test]
    fn test_api_url_has_trailing_slash() {
        let client = client();
        assert_eq!(client.api_url("organizations"), "http://awx.local/api/v2/organizations/");
        assert_eq!(client.api_url("/jobs/4/stdout/"), "http://awx.local/api/v2/jobs/4/stdout/");
        assert_eq!(client.api_url(""), "http://awx.local/api/v2/");
    }

    #[test]
    fn test_absolute_url_for_related_links() {
        let client = client();
        assert_eq!(
            client.absolute_url("/api/v2/projects/6/playbooks/"),
            "http://awx.local/api/v2/projects/6/playbooks/"
        );
        assert_eq!(client.absolute_url("https://other/x"), "https://other/x");
    }
}
