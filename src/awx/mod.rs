//! AWX API interaction module
//!
//! This module provides the transport for the AWX / Ansible Tower REST API:
//! connection settings, the authenticated HTTP client and the client that
//! builds API URLs.
//!
//! # Module Structure
//!
//! - [`settings`] - Connection settings resolution (env, tower-cli files, config)
//! - [`client`] - Main AWX client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use awx_proxy::awx::{client::AwxClient, settings::ConnectionSettings};
//!
//! async fn example() -> awx_proxy::Result<()> {
//!     let settings = ConnectionSettings::new("https://awx.example.com", "admin", "secret")?;
//!     let client = AwxClient::new(settings)?;
//!     let ping = client.get("ping").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod settings;

pub use client::AwxClient;
pub use settings::{ConnectionSettings, SettingsOverrides};
