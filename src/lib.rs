//! armnet: a client for the Azure `Microsoft.Network` control plane
//!
//! Mutating calls return an [`Operation`] that is polled to completion
//! under a deadline; [`ResourceClient`] applies the same get/list/create/
//! delete/tag shape to every registered network resource type.

pub mod azure;
pub mod config;
pub mod error;
pub mod resource;
pub mod samples;

pub use azure::auth::{EnvironmentCredential, StaticTokenCredential, TokenCredential};
pub use azure::client::{ArmClient, ClientOptions};
pub use azure::lro::{Operation, OperationStatus, PollerOptions};
pub use error::{ArmError, ErrorKind, Result};
pub use resource::{ResourceClient, ResourceId};
