//! Workflow node networks
//!
//! A schema is a forest of job template nodes linked by `success`,
//! `failure` and `always` edges:
//!
//! ```yaml
//! - job_template: SYS_RELEASE_common
//!   failure:
//!   - job_template: SYS_RELEASE_vipatel
//!   success:
//!   - job_template: force_failure
//! ```

use crate::error::{AwxError, Result};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One node of a workflow schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNodeSpec {
    pub job_template: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success: Vec<WorkflowNodeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure: Vec<WorkflowNodeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub always: Vec<WorkflowNodeSpec>,
}

impl WorkflowNodeSpec {
    pub fn new(job_template: &str) -> Self {
        Self {
            job_template: job_template.to_string(),
            success: Vec::new(),
            failure: Vec::new(),
            always: Vec::new(),
        }
    }

    /// Children per edge, in `success`, `failure`, `always` order
    pub fn edges(&self) -> [(Edge, &[WorkflowNodeSpec]); 3] {
        [
            (Edge::Success, self.success.as_slice()),
            (Edge::Failure, self.failure.as_slice()),
            (Edge::Always, self.always.as_slice()),
        ]
    }

    fn children_mut(&mut self, edge: Edge) -> &mut Vec<WorkflowNodeSpec> {
        match edge {
            Edge::Success => &mut self.success,
            Edge::Failure => &mut self.failure,
            Edge::Always => &mut self.always,
        }
    }
}

/// Link between a parent node and a child node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Success,
    Failure,
    Always,
}

impl Edge {
    pub const ALL: [Edge; 3] = [Edge::Success, Edge::Failure, Edge::Always];

    /// Node sub-resource holding the children on this edge
    pub fn sub_resource(&self) -> &'static str {
        match self {
            Self::Success => "success_nodes",
            Self::Failure => "failure_nodes",
            Self::Always => "always_nodes",
        }
    }
}

/// Parse a schema document; JSON is accepted as a YAML subset
pub fn parse_schema(content: &str) -> Result<Vec<WorkflowNodeSpec>> {
    let trimmed = content.trim_start();
    let nodes: Vec<WorkflowNodeSpec> = if trimmed.starts_with('[') || trimmed.starts_with('{') {
        serde_json::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };

    if nodes.is_empty() {
        return Err(AwxError::validation("Workflow schema has no nodes"));
    }
    Ok(nodes)
}

pub fn load_schema(path: &Path) -> Result<Vec<WorkflowNodeSpec>> {
    if !path.exists() {
        return Err(AwxError::validation(format!(
            "Workflow schema {} not found.",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    parse_schema(&content)
}

/// Rebuild the schema tree from a workflow's node listing
///
/// Roots are nodes no other node points to. A node reached twice on the
/// same path (a cycle) is not expanded again.
pub fn build_schema(nodes: &[Resource]) -> Vec<WorkflowNodeSpec> {
    let by_id: HashMap<i64, &Resource> = nodes.iter().map(|n| (n.id, n)).collect();

    let referenced: HashSet<i64> = nodes
        .iter()
        .flat_map(|n| Edge::ALL.into_iter().flat_map(move |e| child_ids(n, e)))
        .collect();

    nodes
        .iter()
        .filter(|n| !referenced.contains(&n.id))
        .map(|root| expand(root, &by_id, &mut Vec::new()))
        .collect()
}

fn expand(node: &Resource, by_id: &HashMap<i64, &Resource>, path: &mut Vec<i64>) -> WorkflowNodeSpec {
    let mut spec = WorkflowNodeSpec::new(&node_template_name(node));
    path.push(node.id);

    for edge in Edge::ALL {
        for child_id in child_ids(node, edge) {
            if path.contains(&child_id) {
                tracing::warn!("Workflow node {} links back to {}", node.id, child_id);
                continue;
            }
            if let Some(child) = by_id.get(&child_id) {
                let child_spec = expand(child, by_id, path);
                spec.children_mut(edge).push(child_spec);
            }
        }
    }

    path.pop();
    spec
}

fn child_ids(node: &Resource, edge: Edge) -> Vec<i64> {
    node.fields
        .get(edge.sub_resource())
        .and_then(|v| v.as_array())
        .map(|ids| ids.iter().filter_map(|id| id.as_i64()).collect())
        .unwrap_or_default()
}

/// Template name from `summary_fields`, falling back to the raw id
fn node_template_name(node: &Resource) -> String {
    node.fields
        .get("summary_fields")
        .and_then(|s| s.get("unified_job_template"))
        .and_then(|t| t.get("name"))
        .and_then(|n| n.as_str())
        .map(|s| s.to_string())
        .or_else(|| node.int_field("unified_job_template").map(|id| id.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &str = "
- job_template: SYS_RELEASE_common
  failure:
  - job_template: SYS_RELEASE_vipatel
  success:
  - job_template: force_failure
    failure:
    - job_template: SYS_RELEASE_vipatel
";

    fn node(id: i64, name: &str, success: &[i64], failure: &[i64]) -> Resource {
        Resource::from_value(json!({
            "id": id,
            "unified_job_template": id * 10,
            "success_nodes": success,
            "failure_nodes": failure,
            "always_nodes": [],
            "summary_fields": {"unified_job_template": {"name": name}}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_yaml_schema() {
        let nodes = parse_schema(SCHEMA).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].job_template, "SYS_RELEASE_common");
        assert_eq!(nodes[0].success[0].failure[0].job_template, "SYS_RELEASE_vipatel");
        assert!(nodes[0].always.is_empty());
    }

    #[test]
    fn test_parse_json_schema() {
        let nodes = parse_schema(r#"[{"job_template": "a", "always": [{"job_template": "b"}]}]"#).unwrap();
        assert_eq!(nodes[0].always[0].job_template, "b");
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        assert!(parse_schema("[]").is_err());
    }

    #[test]
    fn test_build_schema_from_nodes() {
        let nodes = vec![
            node(1, "SYS_RELEASE_common", &[2], &[3]),
            node(2, "force_failure", &[], &[4]),
            node(3, "SYS_RELEASE_vipatel", &[], &[]),
            node(4, "SYS_RELEASE_vipatel", &[], &[]),
        ];

        assert_eq!(build_schema(&nodes), parse_schema(SCHEMA).unwrap());
    }

    #[test]
    fn test_cycles_are_not_followed() {
        let nodes = vec![node(1, "a", &[2], &[]), node(2, "b", &[1], &[])];
        // every node is referenced, so there is no root
        assert!(build_schema(&nodes).is_empty());

        let nodes = vec![node(1, "a", &[2], &[]), node(2, "b", &[3], &[]), node(3, "c", &[2], &[])];
        let built = build_schema(&nodes);
        assert_eq!(built.len(), 1);
        assert!(built[0].success[0].success[0].success.is_empty());
    }
}
