//! Azure Resource Manager interaction module
//!
//! Core functionality for talking to the ARM control plane: authentication,
//! HTTP transport, the client, and long-running operation polling.
//!
//! # Module Structure
//!
//! - [`auth`] - Token credentials and token caching
//! - [`client`] - Main ARM client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`lro`] - Long-running operation handles and the poller
//!
//! # Example
//!
//! ```ignore
//! use armnet::azure::auth::EnvironmentCredential;
//! use armnet::azure::client::{ArmClient, ClientOptions};
//! use std::sync::Arc;
//!
//! async fn example() -> armnet::Result<()> {
//!     let options = ClientOptions::new("00000000-0000-0000-0000-000000000000");
//!     let client = ArmClient::new(options, Arc::new(EnvironmentCredential::new()?))?;
//!     let url = client.resource_group_url("my-rg", "providers/Microsoft.Network/virtualNetworks", "2023-09-01")?;
//!     let vnets = client.get(&url).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod lro;
