//! Resource abstraction layer
//!
//! This module provides a data-driven approach to AWX resources. Resource
//! definitions are loaded from a JSON file at compile time; a single generic
//! [`ResourceProxy`] serves every collection.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`fetcher`] - Lists collections with query filters and pagination
//! - [`proxy`] - Generic list/get/create/delete/associate over one collection
//!
//! # Example
//!
//! ```ignore
//! use awx_proxy::resource::{ListQuery, ResourceKind, ResourceProxy};
//!
//! async fn inventories(client: &awx_proxy::awx::AwxClient) -> awx_proxy::Result<()> {
//!     let proxy = ResourceProxy::new(client, ResourceKind::Inventory);
//!     let page = proxy.list_with(&ListQuery::new().filter("organization", 1)).await?;
//!     Ok(())
//! }
//! ```

pub mod fetcher;
pub mod proxy;
pub mod registry;

pub use fetcher::{extract_json_value, fetch_all, fetch_page, ListPage, ListQuery, Resource};
pub use proxy::ResourceProxy;
pub use registry::*;
