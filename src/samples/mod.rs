//! Typed helpers for common network resources
//!
//! Each helper issues one operation through [`ResourceClient`](crate::resource::ResourceClient)
//! and, for creates, waits for the operation and returns the new resource's
//! ID so it can be embedded in dependent requests:
//!
//! ```ignore
//! let vnet = create_virtual_network(&client, "rg", "vnet", &["10.0.0.0/16"]).await?;
//! let subnet = create_subnet(&client, &vnet, "default", "10.0.0.0/24").await?;
//! let nic = create_network_interface(&client, "rg", "nic", &subnet, None).await?;
//! ```

mod network_interface;
mod route_table;
mod virtual_network;

pub use network_interface::*;
pub use route_table::*;
pub use virtual_network::*;

use crate::error::Result;
use crate::resource::{Resource, ResourceId};

/// ID reported by the control plane, or the requested one if the response omits it
fn created_id<P>(created: &Resource<P>, requested: ResourceId) -> Result<ResourceId> {
    match created.id {
        Some(_) => created.resource_id(),
        None => Ok(requested),
    }
}
