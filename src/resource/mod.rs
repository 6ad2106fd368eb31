//! Resource abstraction layer
//!
//! A data-driven approach to the `Microsoft.Network` resource types.
//! Resource definitions are loaded from JSON at compile time, so a new
//! resource type is a registry entry rather than another wrapper module.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`id`] - Parses and formats ARM resource identifiers
//! - [`model`] - The common resource envelope used on the wire
//! - [`fetcher`] - Follows `nextLink` pagination for list calls
//! - [`operations`] - Get/list/create/delete/tag operations per resource type
//!
//! # Example
//!
//! ```ignore
//! use armnet::resource::ResourceClient;
//!
//! async fn list_vnets(client: &armnet::ArmClient) -> armnet::Result<Vec<serde_json::Value>> {
//!     let vnets = ResourceClient::new(client, "virtual-networks")?;
//!     vnets.list("my-rg", &[]).await
//! }
//! ```

pub mod fetcher;
pub mod id;
pub mod model;
pub mod operations;
mod registry;

pub use fetcher::extract_json_value;
pub use id::ResourceId;
pub use model::{Resource, Sku, SubResource, TagsObject};
pub use operations::ResourceClient;
pub use registry::*;
