//! Jobs launched from job templates

use super::job_template::JobTemplateProxy;
use super::unified_job::{JobState, UnifiedJobProxy};
use crate::awx::AwxClient;
use crate::error::{AwxError, Result};
use crate::resource::{ListPage, Resource, ResourceKind};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct JobProxy {
    jobs: UnifiedJobProxy,
    job_template: JobTemplateProxy,
}

impl JobProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            jobs: UnifiedJobProxy::new(client, ResourceKind::Job),
            job_template: JobTemplateProxy::new(client),
        }
    }

    pub fn job_template(&self) -> &JobTemplateProxy {
        &self.job_template
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.jobs.list().await
    }

    /// Launch a job from the named template; returns the new job id
    ///
    /// `reason` is only recorded in the log; the launch endpoint has no
    /// field for it.
    pub async fn launch(&self, template: &str, reason: &str, extra_vars: Option<&Map<String, Value>>) -> Result<i64> {
        let template = self.job_template.get(template).await?;

        let mut body = Map::new();
        if let Some(extra_vars) = extra_vars {
            body.insert("extra_vars".into(), Value::Object(extra_vars.clone()));
        }

        let response = self
            .job_template
            .resource()
            .post_action(template.id, "launch", Some(&Value::Object(body)))
            .await?;

        let job_id = launched_id(&response, "job")?;
        tracing::info!(
            "Launched job {} from template {} ({}).",
            job_id,
            template.name().unwrap_or("-"),
            reason
        );
        Ok(job_id)
    }

    pub async fn status(&self, id: i64) -> Result<JobState> {
        self.jobs.status(id).await
    }

    pub async fn stdout(&self, id: i64) -> Result<String> {
        self.jobs.stdout(id).await
    }

    pub async fn summary(&self, id: i64) -> Result<Resource> {
        self.jobs.summary(id).await
    }

    pub async fn monitor(&self, id: i64, interval: Duration, timeout: Option<Duration>) -> Result<JobState> {
        self.jobs.monitor(id, interval, timeout).await
    }

    pub async fn cancel(&self, id: i64) -> Result<bool> {
        self.jobs.cancel(id).await
    }
}

/// Job id from a launch response (`job`, `workflow_job`, ... or `id`)
pub(crate) fn launched_id(response: &Value, key: &str) -> Result<i64> {
    response
        .get(key)
        .or_else(|| response.get("id"))
        .and_then(|v| v.as_i64())
        .ok_or_else(|| AwxError::validation(format!("Launch response did not include a {} id", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launched_id() {
        assert_eq!(launched_id(&json!({"job": 7, "id": 7}), "job").unwrap(), 7);
        assert_eq!(launched_id(&json!({"id": 9}), "workflow_job").unwrap(), 9);
        assert!(launched_id(&json!({}), "job").is_err());
    }
}
