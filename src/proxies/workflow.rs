//! Workflow job templates

use super::organization::OrganizationProxy;
use super::workflow_schema::{self, build_schema, Edge, WorkflowNodeSpec};
use crate::awx::AwxClient;
use crate::error::Result;
use crate::resource::{fetcher, ListPage, ListQuery, Resource, ResourceKind, ResourceProxy};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone)]
pub struct WorkflowProxy {
    resource: ResourceProxy,
    nodes: ResourceProxy,
    job_template: ResourceProxy,
    organization: OrganizationProxy,
}

impl WorkflowProxy {
    pub fn new(client: &AwxClient) -> Self {
        Self {
            resource: ResourceProxy::new(client, ResourceKind::Workflow),
            nodes: ResourceProxy::new(client, ResourceKind::Node),
            job_template: ResourceProxy::new(client, ResourceKind::JobTemplate),
            organization: OrganizationProxy::new(client),
        }
    }

    pub fn resource(&self) -> &ResourceProxy {
        &self.resource
    }

    pub async fn list(&self) -> Result<ListPage> {
        self.resource.list().await
    }

    pub async fn get(&self, name: &str) -> Result<Resource> {
        self.resource.get_by_name(name).await
    }

    pub async fn create(
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
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        self.resource.create(payload, fail_on_found).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.resource.delete(&ListQuery::new().filter("name", name)).await
    }

    /// Replace the node network of a workflow with the schema file at `path`
    pub async fn upload_schema(&self, name: &str, path: &Path) -> Result<Vec<WorkflowNodeSpec>> {
        let schema = workflow_schema::load_schema(path)?;
        let workflow = self.get(name).await?;
        self.apply_schema(&workflow, &schema).await?;
        Ok(schema)
    }

    /// Replace the node network of a workflow with `schema`
    pub async fn apply_schema(&self, workflow: &Resource, schema: &[WorkflowNodeSpec]) -> Result<()> {
        let template_ids = self.resolve_templates(schema).await?;

        let existing = self.workflow_nodes(workflow.id).await?;
        for node in &existing {
            self.nodes.delete_by_id(node.id).await?;
        }
        tracing::debug!("Removed {} nodes from workflow {}", existing.len(), workflow.id);

        let client = self.resource.client();
        let roots_path = self.resource.item_path(workflow.id, Some("workflow_nodes"));

        // (parent node id and edge, spec); roots have no parent
        let mut pending: Vec<(Option<(i64, Edge)>, &WorkflowNodeSpec)> =
            schema.iter().rev().map(|spec| (None, spec)).collect();
        let mut created = 0usize;

        while let Some((parent, spec)) = pending.pop() {
            let body = json!({ "unified_job_template": template_ids[&spec.job_template] });
            let path = match parent {
                Some((parent_id, edge)) => self.nodes.item_path(parent_id, Some(edge.sub_resource())),
                None => roots_path.clone(),
            };

            let node = Resource::from_value(client.post(&path, Some(&body)).await?)?;
            created += 1;

            for (edge, children) in spec.edges().into_iter().rev() {
                for child in children.iter().rev() {
                    pending.push((Some((node.id, edge)), child));
                }
            }
        }

        tracing::info!(
            "Workflow template {} schema uploaded ({} nodes).",
            workflow.name().unwrap_or("-"),
            created
        );
        Ok(())
    }

    /// Current node network of a workflow
    pub async fn get_schema(&self, name: &str) -> Result<Vec<WorkflowNodeSpec>> {
        let workflow = self.get(name).await?;
        let nodes = self.workflow_nodes(workflow.id).await?;
        Ok(build_schema(&nodes))
    }

    async fn workflow_nodes(&self, workflow_id: i64) -> Result<Vec<Resource>> {
        let path = self.resource.item_path(workflow_id, Some("workflow_nodes"));
        fetcher::fetch_all(self.resource.client(), &path, &ListQuery::new()).await
    }

    /// Job template ids for every template named in the schema
    async fn resolve_templates(&self, schema: &[WorkflowNodeSpec]) -> Result<HashMap<String, i64>> {
        let mut ids = HashMap::new();
        let mut stack: Vec<&WorkflowNodeSpec> = schema.iter().collect();

        while let Some(spec) = stack.pop() {
            if !ids.contains_key(&spec.job_template) {
                let template = self.job_template.get_by_name(&spec.job_template).await?;
                ids.insert(spec.job_template.clone(), template.id);
            }
            for (_, children) in spec.edges() {
                stack.extend(children.iter());
            }
        }

        Ok(ids)
    }
}
