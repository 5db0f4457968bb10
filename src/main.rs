use anyhow::{bail, Context, Result};
use awx_proxy::awx::http::format_awx_error;
use awx_proxy::config::Config;
use awx_proxy::proxies::unified_job::DEFAULT_MONITOR_INTERVAL;
use awx_proxy::proxies::UnifiedJobProxy;
use awx_proxy::resource::{extract_json_value, ListQuery, ResourceKind};
use awx_proxy::scenario::{RunnerOptions, Scenario, ScenarioRunner};
use awx_proxy::{Awx, AwxError, ConnectionSettings, SettingsOverrides};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command line client for AWX / Ansible Tower
#[derive(Parser, Debug)]
#[command(name = "awx-proxy", version, about, long_about = None)]
struct Args {
    /// AWX host, e.g. https://awx.example.com
    #[arg(long, global = true)]
    host: Option<String>,

    /// Username to authenticate as
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password (prefer TOWER_PASSWORD)
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Log level for debugging (written to the log file)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Output format for records
    #[arg(short, long, value_enum, global = true, default_value = "json")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a resource collection
    List {
        /// Resource kind (organization, inventory, host, ...)
        kind: String,
        /// Server-side filter, repeatable: --filter name=web
        #[arg(short, long)]
        filter: Vec<String>,
        /// Follow every page instead of the first one
        #[arg(long)]
        all: bool,
    },
    /// Show one resource by name
    Get {
        kind: String,
        name: String,
        /// Inventory scope for hosts and groups
        #[arg(short, long)]
        inventory: Option<String>,
    },
    /// Playbooks of every project
    Playbooks,
    /// Find the project offering a playbook
    PlaybookProject { playbook: String },
    /// Job status, output and control
    Job {
        #[command(subcommand)]
        action: JobAction,
        /// Treat the id as a workflow job
        #[arg(long, global = true)]
        workflow: bool,
    },
    /// Job ids spawned by a workflow job
    WorkflowJobs { id: i64 },
    /// Show or upload the node network of a workflow template
    Schema {
        workflow: String,
        /// Schema file (JSON or YAML) to upload
        #[arg(long)]
        upload: Option<PathBuf>,
    },
    /// Server and client versions
    Version,
    /// Run a provisioning scenario file
    Scenario {
        file: PathBuf,
        /// Organization to work in
        #[arg(long)]
        organization: Option<String>,
        /// Seconds before a job is cancelled
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Store defaults in the config file
    Configure {
        /// Organization used when none is given
        #[arg(long)]
        organization: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum JobAction {
    Status { id: i64 },
    Stdout { id: i64 },
    Monitor {
        id: i64,
        /// Poll interval in seconds
        #[arg(long, default_value_t = 1)]
        interval: u64,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    Cancel { id: i64 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(directive) = level.directive() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("awx-proxy started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("awx-proxy").join("awx-proxy.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".awx-proxy").join("awx-proxy.log");
    }
    PathBuf::from("awx-proxy.log")
}

fn print_record<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn print_table(items: &[serde_json::Value], name_field: &str) {
    println!("{:<8} {:<40} {}", "ID", name_field.to_uppercase(), "DESCRIPTION");
    for item in items {
        println!(
            "{:<8} {:<40} {}",
            extract_json_value(item, "id"),
            extract_json_value(item, name_field),
            extract_json_value(item, "description")
        );
    }
}

fn parse_filters(filters: &[String]) -> Result<ListQuery> {
    let mut query = ListQuery::new();
    for filter in filters {
        let Some((key, value)) = filter.split_once('=') else {
            bail!("Filters look like key=value, got {}", filter);
        };
        query = query.filter(key.trim(), value.trim());
    }
    Ok(query)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::load();

    let level = args
        .log_level
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|l| LogLevel::from_str(l, true).ok())
        })
        .unwrap_or(LogLevel::Off);

    let _log_guard = match setup_logging(level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    if let Err(err) = run(args, config).await {
        match err.downcast_ref::<AwxError>() {
            Some(awx_err) => eprintln!("Error: {}", format_awx_error(awx_err)),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

fn configure(args: &Args, organization: Option<String>, mut config: Config) -> Result<()> {
    if args.host.is_some() {
        config.host = args.host.clone();
    }
    if args.username.is_some() {
        config.username = args.username.clone();
    }
    if args.insecure {
        config.verify_ssl = Some(false);
    }
    if organization.is_some() {
        config.default_organization = organization;
    }
    config.save()?;
    if let Some(path) = Config::config_path() {
        println!("Saved {}", path.display());
    }
    Ok(())
}

async fn run(args: Args, config: Config) -> Result<()> {
    if let Command::Configure { organization } = &args.command {
        return configure(&args, organization.clone(), config);
    }

    let overrides = SettingsOverrides {
        host: args.host.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        verify_ssl: args.insecure.then_some(false),
    };
    let settings = ConnectionSettings::resolve(overrides, &config)?;
    let awx = Awx::new(settings)?;
    let output = args.output;

    match args.command {
        Command::List { kind, filter, all } => {
            let kind: ResourceKind = kind.parse()?;
            let def = kind.def();

            if kind == ResourceKind::Setting {
                return print_record(&awx.setting.categories().await?, output);
            }
            if def.singleton {
                return print_record(&awx.resource(kind).fetch().await?, output);
            }

            let query = parse_filters(&filter)?;
            let proxy = awx.resource(kind);
            let items: Vec<serde_json::Value> = if all {
                proxy.list_all(&query).await?.iter().map(|r| r.to_value()).collect()
            } else {
                let page = proxy.list_with(&query).await?;
                if page.next.is_some() {
                    eprintln!("Showing {} of {} (use --all for every page)", page.results.len(), page.count);
                }
                page.results.iter().map(|r| r.to_value()).collect()
            };
            print_table(&items, &def.name_field);
        },
        Command::Get { kind, name, inventory } => {
            let kind: ResourceKind = kind.parse()?;
            let record = match (kind, inventory.as_deref()) {
                (ResourceKind::Organization, _) => awx.organization.get(&name).await?.to_value(),
                (ResourceKind::Host, Some(inv)) => awx.host.get(&name, inv).await?.to_value(),
                (ResourceKind::Group, Some(inv)) => awx.group.get(&name, inv).await?.to_value(),
                (ResourceKind::Setting, _) => awx.setting.get(&name).await?,
                (ResourceKind::Config | ResourceKind::Version, _) => awx.resource(kind).fetch().await?,
                _ => awx.resource(kind).get_by_name(&name).await?.to_value(),
            };
            print_record(&record, output)?;
        },
        Command::Playbooks => {
            print_record(&awx.project.playbooks().await?, output)?;
        },
        Command::PlaybookProject { playbook } => match awx.project.get_playbook_project(&playbook).await? {
            Some(project) => println!("{}", project),
            None => bail!("No project offers playbook {}", playbook),
        },
        Command::Job { action, workflow } => {
            let kind = job_kind(&action, workflow)?;
            run_job_action(&UnifiedJobProxy::new(awx.client(), kind), action, output).await?;
        },
        Command::WorkflowJobs { id } => {
            print_record(&awx.workflow_job.get_jobs(id).await?, output)?;
        },
        Command::Schema { workflow, upload } => {
            let schema = match upload {
                Some(path) => awx.workflow.upload_schema(&workflow, &path).await?,
                None => awx.workflow.get_schema(&workflow).await?,
            };
            print_record(&schema, output)?;
        },
        Command::Version => {
            let server = awx.version.server().await?;
            println!("awx-proxy {}", awx.version.client());
            println!("AWX {}", server.version);
        },
        Command::Scenario {
            file,
            organization,
            timeout,
        } => {
            let scenario = Scenario::load(&file).with_context(|| format!("Failed to load {}", file.display()))?;
            let organization = organization
                .or_else(|| scenario.organization.clone())
                .unwrap_or_else(|| config.effective_organization());

            let options = RunnerOptions {
                monitor_timeout: Duration::from_secs(timeout),
                ..RunnerOptions::default()
            };
            let runner = ScenarioRunner::new(awx, &organization, options);
            eprintln!("Scenario run {} in organization {}", runner.run_id(), organization);

            let report = runner.run(&scenario).await?;
            print_record(&report, output)?;
            if !report.succeeded() {
                bail!("Scenario run {} had failing tasks", report.run_id);
            }
        },
        Command::Configure { .. } => bail!("configure does not contact the server"),
    }

    Ok(())
}

/// Job collection an action runs against; workflow jobs have no stdout
fn job_kind(action: &JobAction, workflow: bool) -> Result<ResourceKind> {
    if !workflow {
        return Ok(ResourceKind::Job);
    }
    if let JobAction::Stdout { id } = action {
        bail!(
            "Workflow job {} has no stdout; list its jobs with workflow-jobs {}",
            id,
            id
        );
    }
    Ok(ResourceKind::WorkflowJob)
}

async fn run_job_action(jobs: &UnifiedJobProxy, action: JobAction, output: OutputFormat) -> Result<()> {
    match action {
        JobAction::Status { id } => print_record(&jobs.status(id).await?, output)?,
        JobAction::Stdout { id } => print!("{}", jobs.stdout(id).await?),
        JobAction::Monitor { id, interval, timeout } => {
            let interval = if interval == 0 {
                DEFAULT_MONITOR_INTERVAL
            } else {
                Duration::from_secs(interval)
            };
            let state = jobs.monitor(id, interval, timeout.map(Duration::from_secs)).await?;
            print_record(&state, output)?;
            if !state.status.is_successful() {
                bail!("Job {} finished {}", id, state.status);
            }
        },
        JobAction::Cancel { id } => {
            if jobs.cancel(id).await? {
                println!("Cancel requested for {}", id);
            } else {
                println!("Job {} can no longer be canceled", id);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_args(args: &[&str]) -> (JobAction, bool) {
        let args = Args::try_parse_from(args).unwrap();
        match args.command {
            Command::Job { action, workflow } => (action, workflow),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_workflow_stdout_is_rejected() {
        let (action, workflow) = job_args(&["awx-proxy", "job", "stdout", "7", "--workflow"]);
        let err = job_kind(&action, workflow).unwrap_err();
        assert!(err.to_string().contains("workflow-jobs 7"));
    }

    #[test]
    fn test_job_kinds() {
        let (action, workflow) = job_args(&["awx-proxy", "job", "stdout", "7"]);
        assert_eq!(job_kind(&action, workflow).unwrap(), ResourceKind::Job);

        let (action, workflow) = job_args(&["awx-proxy", "job", "--workflow", "status", "7"]);
        assert_eq!(job_kind(&action, workflow).unwrap(), ResourceKind::WorkflowJob);
    }
}
