//! HTTP utilities for AWX REST API calls

use super::settings::ConnectionSettings;
use crate::error::{AwxError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control() && c != ' ', "")
}

/// Pull a readable message out of an AWX error body
///
/// AWX answers either `{"detail": "..."}` or field errors such as
/// `{"name": ["Organization with this Name already exists."]}`.
pub fn extract_api_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return sanitize_for_log(body);
    };

    if let Some(detail) = value.get("detail").and_then(|v| v.as_str()) {
        return detail.to_string();
    }

    let Some(map) = value.as_object() else {
        return sanitize_for_log(body);
    };

    let mut parts = Vec::new();
    for (field, errors) in map {
        match errors {
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                parts.push(format!("{}: {}", field, joined));
            },
            Value::String(s) => parts.push(format!("{}: {}", field, s)),
            _ => {},
        }
    }

    if parts.is_empty() {
        sanitize_for_log(body)
    } else {
        parts.join("; ")
    }
}

fn error_for_status(status: StatusCode, url: &str, body: &str) -> AwxError {
    let message = extract_api_message(body);
    match status {
        StatusCode::NOT_FOUND => AwxError::NotFound {
            kind: "Resource".to_string(),
            name: url.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AwxError::Unauthorized(message),
        StatusCode::BAD_REQUEST if message.contains("already exists") => AwxError::Found {
            kind: "Resource".to_string(),
            name: message,
        },
        _ => AwxError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// HTTP client wrapper for AWX API calls
///
/// Every request carries HTTP basic authentication.
#[derive(Clone)]
pub struct AwxHttpClient {
    client: Client,
    username: String,
    password: String,
}

impl AwxHttpClient {
    /// Create a new HTTP client
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("awx-proxy/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .build()?;

        if !settings.verify_ssl {
            tracing::warn!("TLS certificate verification disabled for {}", settings.host);
        }

        Ok(Self {
            client,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// Send a request and return the raw body of a successful response
    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> Result<String> {
        tracing::debug!("{} {}", method, url);

        let response = self.authed(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} {} - {} - {}", method, url, status, sanitize_for_log(&body));
            return Err(error_for_status(status, url, &body));
        }

        Ok(body)
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let body = self.send(self.client.get(url), "GET", url).await?;
        parse_body(&body)
    }

    /// Make a GET request and return the body as text
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.send(self.client.get(url), "GET", url).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post_json(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response_body = self.send(request, "POST", url).await?;
        parse_body(&response_body)
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Value> {
        let body = self.send(self.client.delete(url), "DELETE", url).await?;
        parse_body(&body)
    }
}

fn parse_body(body: &str) -> Result<Value> {
    // 202/204 responses carry no body
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Format an AWX error for display
pub fn format_awx_error(error: &AwxError) -> String {
    match error {
        AwxError::Unauthorized(_) => {
            "Authentication failed. Check TOWER_USERNAME / TOWER_PASSWORD or ~/.tower_cli.cfg.".to_string()
        },
        AwxError::Http(e) if e.is_connect() => {
            "Could not connect to the AWX server. Check the host setting.".to_string()
        },
        AwxError::Http(e) if e.is_timeout() => "Request to the AWX server timed out.".to_string(),
        AwxError::Api { status, message } if *status >= 500 => {
            format!("AWX server error ({}). Please try again. {}", status, message)
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_message() {
        let body = r#"{"detail": "Authentication credentials were not provided."}"#;
        assert_eq!(extract_api_message(body), "Authentication credentials were not provided.");
    }

    #[test]
    fn test_extract_field_errors() {
        let body = r#"{"name": ["Organization with this Name already exists."]}"#;
        assert_eq!(
            extract_api_message(body),
            "name: Organization with this Name already exists."
        );
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated, 500 bytes total"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(error_for_status(StatusCode::NOT_FOUND, "/x", "").is_not_found());
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "/x", "{}"),
            AwxError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "/x", "{}"),
            AwxError::Api { status: 400, .. }
        ));

        let duplicate = r#"{"name": ["Organization with this Name already exists."]}"#;
        assert!(error_for_status(StatusCode::BAD_REQUEST, "/x", duplicate).is_found());
    }
}
