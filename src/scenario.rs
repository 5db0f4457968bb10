//! Scenario runner
//!
//! Drives a whole provisioning run from a YAML document:
//!
//! ```yaml
//! provision:
//!   - name: web
//!     host: 10.0.0.5
//!     ansible_vars:
//!       ansible_user: root
//!       ansible_ssh_private_key_file: /keys/id_rsa
//! orchestrate:
//!   - name: site
//!     description: configure web tier
//!     hosts: web
//!     scm:
//!       url: https://github.com/example/playbooks.git
//!       branch: main
//! ```
//!
//! Every run gets a short random id. The inventory, credential and job
//! templates it creates carry that id and are deleted at the end.

use crate::error::{AwxError, Result};
use crate::facade::Awx;
use crate::proxies::{JobStatus, NewJobTemplate, ScmProject, ScmType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

const PRIVATE_KEY_VAR: &str = "ansible_ssh_private_key_file";

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Organization to work in; the configured default when unset
    #[serde(default)]
    pub organization: Option<String>,
    pub provision: Vec<ProvisionHost>,
    #[serde(default)]
    pub orchestrate: Vec<OrchestrateTask>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionHost {
    /// Group the host is placed in
    pub name: String,
    /// Host name or address
    pub host: String,
    #[serde(default)]
    pub ansible_vars: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrateTask {
    /// Playbook base name; `site` runs `site.yml`
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Space or comma separated host groups
    #[serde(default)]
    pub hosts: String,
    #[serde(default)]
    pub scm: Option<ScmSource>,
    #[serde(default)]
    pub extra_vars: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScmSource {
    pub url: String,
    #[serde(rename = "type", default = "default_scm_type")]
    pub scm_type: String,
    #[serde(default)]
    pub branch: Option<String>,
}

fn default_scm_type() -> String {
    "git".to_string()
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)?;
        if scenario.provision.is_empty() {
            return Err(AwxError::validation("Scenario has no hosts to provision"));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// Outcome of one orchestrate task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: String,
    pub job_template: String,
    pub job_id: Option<i64>,
    pub status: Option<String>,
    pub timed_out: bool,
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: String,
    pub inventory: String,
    pub tasks: Vec<TaskOutcome>,
}

impl ScenarioReport {
    pub fn succeeded(&self) -> bool {
        self.tasks
            .iter()
            .filter(|t| !t.skipped)
            .all(|t| t.status.as_deref() == Some(JobStatus::Successful.as_str()))
    }
}

/// Project name from an SCM url: last path segment without extension
pub fn project_name_from_url(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    last.split('.').next().unwrap_or(last).to_string()
}

/// Host pattern for a job template limit: `"web db"` becomes `"web,db"`
pub fn host_limit(hosts: &str) -> String {
    hosts
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Short random id shared by everything one run creates
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..4].to_string()
}

/// Remove and return the private key path from host variables
pub fn take_private_key(vars: &mut Map<String, Value>, host: &str) -> Result<String> {
    match vars.remove(PRIVATE_KEY_VAR) {
        Some(Value::String(path)) => Ok(path),
        _ => Err(AwxError::validation(format!(
            "{} key not found for host {}!",
            PRIVATE_KEY_VAR, host
        ))),
    }
}

/// Polling knobs of a run
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Upper bound on waiting for a new project's SCM update
    pub scm_timeout: Duration,
    pub monitor_interval: Duration,
    pub monitor_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            scm_timeout: Duration::from_secs(15),
            monitor_interval: Duration::from_secs(1),
            monitor_timeout: Duration::from_secs(300),
        }
    }
}

pub struct ScenarioRunner {
    awx: Awx,
    organization: String,
    options: RunnerOptions,
    run_id: String,
}

impl ScenarioRunner {
    pub fn new(awx: Awx, organization: &str, options: RunnerOptions) -> Self {
        Self {
            awx,
            organization: organization.to_string(),
            options,
            run_id: new_run_id(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn inventory_name(&self) -> String {
        format!("inventory_{}", self.run_id)
    }

    fn credential_name(&self) -> String {
        format!("credential_{}", self.run_id)
    }

    fn job_template_name(&self, index: usize) -> String {
        format!("job_{}_{}", self.run_id, index)
    }

    pub async fn run(&self, scenario: &Scenario) -> Result<ScenarioReport> {
        let inventory = self.inventory_name();
        let credential = self.credential_name();
        tracing::info!("Scenario run {} starting.", self.run_id);

        let result = self.provision(scenario, &inventory, &credential).await;
        let tasks = match result {
            Ok(()) => self.orchestrate(scenario, &inventory, &credential).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.awx.inventory.delete(&inventory).await {
            tracing::warn!("Could not delete inventory {}: {}", inventory, e);
        }
        if let Err(e) = self.awx.credential.delete(&credential, "ssh").await {
            tracing::warn!("Could not delete credential {}: {}", credential, e);
        }

        let report = ScenarioReport {
            run_id: self.run_id.clone(),
            inventory,
            tasks: tasks?,
        };
        tracing::info!("Scenario run {} finished.", self.run_id);
        Ok(report)
    }

    async fn provision(&self, scenario: &Scenario, inventory: &str, credential: &str) -> Result<()> {
        self.awx
            .inventory
            .create(inventory, &self.organization, None, None, true)
            .await?;

        for item in &scenario.provision {
            let mut vars = item.ansible_vars.clone();
            let key_file = take_private_key(&mut vars, &item.host)?;

            self.awx.host.create(&item.host, inventory, Some(&vars), false).await?;

            let mut options = Map::new();
            options.insert("ssh_key_data".into(), Value::from(key_file));
            self.awx
                .credential
                .create(credential, "ssh", &self.organization, &options, false)
                .await?;

            self.awx.group.create(&item.name, inventory, false).await?;
            self.awx.host.associate(&item.host, &item.name, inventory).await?;
        }

        Ok(())
    }

    async fn orchestrate(&self, scenario: &Scenario, inventory: &str, credential: &str) -> Result<Vec<TaskOutcome>> {
        let mut outcomes = Vec::new();

        for (index, task) in scenario.orchestrate.iter().enumerate() {
            let job_template = self.job_template_name(index);

            let Some(scm) = task.scm.as_ref().filter(|s| s.scm_type == ScmType::Git.as_str()) else {
                tracing::warn!("Task {} has no git source, skipping.", task.name);
                outcomes.push(TaskOutcome {
                    task: task.name.clone(),
                    job_template,
                    job_id: None,
                    status: None,
                    timed_out: false,
                    skipped: true,
                });
                continue;
            };

            let project = project_name_from_url(&scm.url);
            let outcome = self
                .run_task(task, scm, &project, &job_template, inventory, credential)
                .await;

            self.clean_up_task(&job_template, &project).await;

            outcomes.push(outcome?);
        }

        Ok(outcomes)
    }

    /// Project, template and job of one task; the caller removes what it left behind
    async fn run_task(
        &self,
        task: &OrchestrateTask,
        scm: &ScmSource,
        project: &str,
        job_template: &str,
        inventory: &str,
        credential: &str,
    ) -> Result<TaskOutcome> {
        let mut source = ScmProject::new(project, &self.organization, ScmType::Git, &scm.url);
        source.description = scm.url.clone();
        if let Some(branch) = &scm.branch {
            source.branch = branch.clone();
        }

        match self.awx.project.create_scm_project(&source, true).await {
            Ok(_) => self.wait_for_project(project).await?,
            Err(e) if e.is_found() => tracing::warn!("Project {} already exists.", project),
            Err(e) => return Err(e),
        }

        let playbook = format!("{}.yml", task.name);
        let mut template = NewJobTemplate::new(job_template, inventory, project, &playbook, credential);
        template.description = task.description.clone();
        template.extra_vars = task.extra_vars.clone();
        if !task.hosts.trim().is_empty() {
            template.limit = Some(host_limit(&task.hosts));
        }
        self.awx.job_template.create(&template, true).await?;

        self.launch_and_monitor(task, job_template).await
    }

    async fn clean_up_task(&self, job_template: &str, project: &str) {
        if let Err(e) = self.awx.job_template.delete(job_template, project).await {
            tracing::warn!("Could not delete job template {}: {}", job_template, e);
        }
        if let Err(e) = self.awx.project.delete(project).await {
            tracing::warn!("Could not delete project {}: {}", project, e);
        }
    }

    async fn launch_and_monitor(&self, task: &OrchestrateTask, job_template: &str) -> Result<TaskOutcome> {
        let job_id = self
            .awx
            .job
            .launch(job_template, &task.description, None)
            .await?;

        let mut outcome = TaskOutcome {
            task: task.name.clone(),
            job_template: job_template.to_string(),
            job_id: Some(job_id),
            status: None,
            timed_out: false,
            skipped: false,
        };

        match self
            .awx
            .job
            .monitor(job_id, self.options.monitor_interval, Some(self.options.monitor_timeout))
            .await
        {
            Ok(state) => outcome.status = Some(state.status.to_string()),
            Err(e) if e.is_timeout() => {
                tracing::warn!("{}", e);
                self.awx.job.cancel(job_id).await?;
                outcome.timed_out = true;
                outcome.status = Some(JobStatus::Canceled.to_string());
            },
            Err(e) => return Err(e),
        }

        Ok(outcome)
    }

    /// Wait (bounded) for a freshly created project to finish its first update
    async fn wait_for_project(&self, name: &str) -> Result<()> {
        let started = Instant::now();

        loop {
            let project = self.awx.project.get(name).await?;
            let status = JobStatus::parse(project.str_field("status").unwrap_or("unknown"));
            if status.is_finished() {
                if !status.is_successful() {
                    tracing::warn!("Project {} update ended {}.", name, status);
                }
                return Ok(());
            }
            if started.elapsed() >= self.options.scm_timeout {
                tracing::warn!(
                    "Project {} still {} after {}s, continuing.",
                    name,
                    status,
                    self.options.scm_timeout.as_secs()
                );
                return Ok(());
            }
            tokio::time::sleep(self.options.monitor_interval).await;
        }
    }
}
