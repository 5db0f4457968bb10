//! Workflow jobs

use super::job::launched_id;
use super::unified_job::{JobState, UnifiedJobProxy};
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{fetch_all, ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct WorkflowJobProxy {
    jobs: UnifiedJobProxy,
    workflow: ResourceProxy,
}

impl WorkflowJobProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            jobs: UnifiedJobProxy::new(client, ResourceKind::WorkflowJob),
            workflow: ResourceProxy::new(client, ResourceKind::Workflow),
        }
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.jobs.list().await
    }

    /// Launch the named workflow template; returns the workflow job id
    pub async fn launch(&self, workflow: &str, extra_vars: Option<&Map<String, Value>>) -> Result<i64> {
        let template = self.workflow.get_by_name(workflow).await?;

        let mut body = Map::new();
        if let Some(extra_vars) = extra_vars {
            body.insert("extra_vars".into(), Value::Object(extra_vars.clone()));
        }

        let response = self
            .workflow
            .post_action(template.id, "launch", Some(&Value::Object(body)))
            .await?;

        let job_id = launched_id(&response, "workflow_job")?;
        tracing::info!("Launched workflow job {} from {}.", job_id, workflow);
        Ok(job_id)
    }

    pub async fn status(&self, id: i64) -> Result<JobState> {
        self.jobs.status(id).await
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

    /// Ids of the jobs spawned by a workflow job's nodes
    ///
    /// Nodes that never ran (skipped branches) have no job and are left out.
    pub async fn get_jobs(&self, id: i64) -> Result<Vec<i64>> {
        let client = self.jobs.resource().client();
        let endpoint = format!("workflow_jobs/{}/workflow_nodes", id);
        let nodes = fetch_all(client, &endpoint, &ListQuery::new()).await?;
        Ok(node_job_ids(&nodes))
    }
}

fn node_job_ids(nodes: &[Resource]) -> Vec<i64> {
    nodes.iter().filter_map(|node| node.int_field("job")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_job_ids_skip_nodes_without_jobs() {
        let nodes: Vec<Resource> = [
            json!({"id": 1, "job": 40}),
            json!({"id": 2, "job": null}),
            json!({"id": 3, "job": 42}),
        ]
        .into_iter()
        .map(|node| Resource::from_value(node).unwrap())
        .collect();
        assert_eq!(node_job_ids(&nodes), vec![40, 42]);
        assert!(node_job_ids(&[]).is_empty());
    }
}
