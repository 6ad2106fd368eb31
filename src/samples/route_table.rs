//! Route tables and user-defined routes

use super::created_id;
use crate::azure::client::ArmClient;
use crate::error::Result;
use crate::resource::{Resource, ResourceClient, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where traffic matching a route is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHop {
    Internet,
    VirtualNetworkGateway,
    VnetLocal,
    None,
    /// A network virtual appliance at the given private IP
    VirtualAppliance(String),
}

impl NextHop {
    pub fn hop_type(&self) -> &'static str {
        match self {
            NextHop::Internet => "Internet",
            NextHop::VirtualNetworkGateway => "VirtualNetworkGateway",
            NextHop::VnetLocal => "VnetLocal",
            NextHop::None => "None",
            NextHop::VirtualAppliance(_) => "VirtualAppliance",
        }
    }

    pub fn ip_address(&self) -> Option<&str> {
        match self {
            NextHop::VirtualAppliance(ip) => Some(ip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableProperties {
    #[serde(default)]
    pub disable_bgp_route_propagation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

pub async fn create_route_table(
    client: &ArmClient,
    resource_group: &str,
    name: &str,
) -> Result<ResourceId> {
    let tables = ResourceClient::new(client, "route-tables")?;
    let id = tables.id(resource_group, &[], name)?;

    let created = tables
        .create_or_update_typed(&id, &Resource::new(RouteTableProperties::default()))
        .await?;
    created_id(&created, id)
}

/// Add a route for `address_prefix` to `route_table`
pub async fn create_route(
    client: &ArmClient,
    route_table: &ResourceId,
    name: &str,
    address_prefix: &str,
    next_hop: &NextHop,
) -> Result<ResourceId> {
    let routes = ResourceClient::new(client, "routes")?;
    let id = route_table.child("routes", name);

    let request = Resource::new(RouteProperties {
        address_prefix: Some(address_prefix.to_string()),
        next_hop_type: Some(next_hop.hop_type().to_string()),
        next_hop_ip_address: next_hop.ip_address().map(str::to_string),
        provisioning_state: None,
    });

    let created = routes.create_or_update_typed(&id, &request).await?;
    created_id(&created, id)
}

pub async fn list_routes(client: &ArmClient, route_table: &ResourceId) -> Result<Vec<Value>> {
    ResourceClient::new(client, "routes")?
        .list(route_table.resource_group(), &[route_table.name()])
        .await
}

pub async fn delete_route_table(client: &ArmClient, id: &ResourceId) -> Result<()> {
    ResourceClient::new(client, "route-tables")?
        .delete(id)
        .await
}
