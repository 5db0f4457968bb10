//! Unified jobs
//!
//! Jobs, workflow jobs, project updates and ad hoc commands share one
//! remote lifecycle: `pending -> running -> successful | failed | canceled`.
//! [`UnifiedJobProxy`] observes it for any of those kinds.

use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, Resource, ResourceKind, ResourceProxy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Default poll interval for [`UnifiedJobProxy::monitor`]
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Remote job state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    New,
    Pending,
    Waiting,
    Running,
    Successful,
    Failed,
    Error,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::from(s.to_lowercase())).unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Pending => "pending",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }

    /// No further transitions will happen
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Error | Self::Canceled)
    }

    pub fn is_successful(&self) -> bool {
        *self == Self::Successful
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a job as reported by the server
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub id: i64,
    pub name: Option<String>,
    pub status: JobStatus,
    pub failed: bool,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub elapsed: f64,
}

impl JobState {
    pub fn from_resource(resource: &Resource) -> Self {
        let timestamp = |key: &str| {
            resource
                .str_field(key)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };

        Self {
            id: resource.id,
            name: resource.name().map(|s| s.to_string()),
            status: JobStatus::parse(resource.str_field("status").unwrap_or("unknown")),
            failed: resource.fields.get("failed").and_then(|v| v.as_bool()).unwrap_or(false),
            started: timestamp("started"),
            finished: timestamp("finished"),
            elapsed: resource.fields.get("elapsed").and_then(|v| v.as_f64()).unwrap_or(0.0),
        }
    }
}

#[derive(Clone)]
pub struct UnifiedJobProxy {
    resource: ResourceProxy,
}

impl UnifiedJobProxy {
    pub fn new(client: &AwxClient, kind: ResourceKind) -> Self {
        Self {
            resource: ResourceProxy::new(client, kind),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    pub async fn status(&self, id: i64) -> Result<JobState> {
        let job = self.resource.get_by_id(id).await?;
        Ok(JobState::from_resource(&job))
    }

    /// Full job record
    pub async fn summary(&self, id: i64) -> Result<Resource> {
        self.resource.get_by_id(id).await
    }

    /// Plain-text job output
    pub async fn stdout(&self, id: i64) -> Result<String> {
        let path = self.resource.item_path(id, Some("stdout"));
        self.resource.client().get_text(&path, "format=txt").await
    }

    /// Poll until the job finishes
    ///
    /// Returns [`AwxError::Timeout`] once `timeout` has elapsed; the job keeps
    /// running remotely and callers decide whether to [`cancel`](Self::cancel).
    pub async fn monitor(&self, id: i64, interval: Duration, timeout: Option<Duration>) -> Result<JobState> {
        let started = Instant::now();
        let mut last_status: Option<JobStatus> = None;

        loop {
            let state = self.status(id).await?;

            if last_status.as_ref() != Some(&state.status) {
                tracing::info!("{} {} is {}", self.resource.display_name(), id, state.status);
                last_status = Some(state.status.clone());
            }

            if state.status.is_finished() {
                return Ok(state);
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    tracing::warn!(
                        "Stopped monitoring {} {} after {}s",
                        self.resource.display_name(),
                        id,
                        limit.as_secs()
                    );
                    return Err(AwxError::Timeout {
                        job_id: id,
                        seconds: limit.as_secs(),
                    });
                }
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Request cancellation; `false` when the server reports it cannot cancel
    pub async fn cancel(&self, id: i64) -> Result<bool> {
        let check = self.resource.get_sub(id, "cancel").await?;
        let can_cancel = check.get("can_cancel").and_then(|v| v.as_bool()).unwrap_or(true);

        if !can_cancel {
            tracing::warn!("{} {} can no longer be canceled.", self.resource.display_name(), id);
            return Ok(false);
        }

        self.resource.post_action(id, "cancel", None).await?;
        tracing::info!("{} {} cancel requested.", self.resource.display_name(), id);
        Ok(true)
    }
}
