//! awx-proxy
//!
//! Typed client for the AWX / Ansible Tower REST API. One proxy per
//! resource kind turns name based calls into API requests:
//!
//! ```ignore
//! use awx_proxy::{Awx, ConnectionSettings};
//!
//! async fn example() -> awx_proxy::Result<()> {
//!     let awx = Awx::new(ConnectionSettings::new("https://awx.example.com", "admin", "secret")?)?;
//!     awx.organization.create("uc01", None, true).await?;
//!     awx.inventory.create("uc01", "uc01", None, None, true).await?;
//!     awx.host.create("localhost", "uc01", None, true).await?;
//!     Ok(())
//! }
//! ```

pub mod awx;
pub mod config;
pub mod error;
pub mod facade;
pub mod proxies;
pub mod resource;
pub mod scenario;

pub use awx::{AwxClient, ConnectionSettings, SettingsOverrides};
pub use error::{AwxError, Result};
pub use facade::Awx;
