//! Error types
//!
//! Every failure the library can report is one of the [`AwxError`] variants.
//! Remote lookups that miss and duplicate creations are separate variants so
//! callers can match on them instead of searching message text.

use thiserror::Error;

/// Errors returned by the AWX client and resource proxies
#[derive(Error, Debug)]
pub enum AwxError {
    #[error("{kind} {name} not found.")]
    NotFound { kind: String, name: String },

    #[error("{kind} {name} already exists.")]
    Found { kind: String, name: String },

    #[error("Expected one {kind}, got several for {query}.")]
    MultipleFound { kind: String, query: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Monitoring of job {job_id} aborted due to timeout after {seconds}s.")]
    Timeout { job_id: i64, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AwxError {
    pub fn not_found(kind: &str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            name: name.into(),
        }
    }

    pub fn found(kind: &str, name: impl Into<String>) -> Self {
        Self::Found {
            kind: kind.to_string(),
            name: name.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for a remote lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when a create collided with an existing resource
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, AwxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_message_keeps_already_exists_wording() {
        let err = AwxError::found("Organization", "uc01");
        assert!(err.is_found());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_timeout_message_keeps_aborted_wording() {
        let err = AwxError::Timeout {
            job_id: 42,
            seconds: 60,
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("aborted due to timeout"));
    }

    #[test]
    fn test_not_found_is_distinct_from_generic_errors() {
        let err = AwxError::not_found("User", "kingbob");
        assert!(err.is_not_found());
        assert!(!AwxError::validation("x").is_not_found());
        assert!(!err.is_found());
    }
}
