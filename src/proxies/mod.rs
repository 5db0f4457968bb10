//! Per-kind resource proxies
//!
//! Each proxy wraps one [`ResourceProxy`](crate::resource::ResourceProxy)
//! and adds the lookups and validation rules of its kind. References to
//! other resources are taken by name and resolved before anything is
//! written.

pub mod ad_hoc;
pub mod credential;
pub mod group;
pub mod host;
pub mod inventory;
pub mod job;
pub mod job_template;
pub mod notification_template;
pub mod organization;
pub mod project;
pub mod role;
pub mod simple;
pub mod team;
pub mod unified_job;
pub mod user;
pub mod workflow;
pub mod workflow_job;
pub mod workflow_schema;

pub use ad_hoc::{AdHocCommand, AdHocProxy};
pub use credential::{CredentialHandlers, CredentialKind, CredentialProxy};
pub use group::GroupProxy;
pub use host::HostProxy;
pub use inventory::InventoryProxy;
pub use job::JobProxy;
pub use job_template::{JobTemplateProxy, NewJobTemplate, NotificationEvent};
pub use notification_template::{NotificationConfig, NotificationTemplateProxy};
pub use organization::OrganizationProxy;
pub use project::{ProjectPlaybooks, ProjectProxy, ScmProject, ScmType};
pub use role::{Grantee, RoleProxy, RoleRequest};
pub use simple::{ConfigProxy, ServerVersion, SettingProxy, VersionProxy};
pub use team::TeamProxy;
pub use unified_job::{JobState, JobStatus, UnifiedJobProxy};
pub use user::{NewUser, UserProxy};
pub use workflow::WorkflowProxy;
pub use workflow_job::WorkflowJobProxy;
pub use workflow_schema::WorkflowNodeSpec;
