//! Virtual networks and subnets

use super::created_id;
use crate::azure::client::ArmClient;
use crate::error::Result;
use crate::resource::{Resource, ResourceClient, ResourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(default)]
    pub address_space: AddressSpace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Create a virtual network and wait for it
pub async fn create_virtual_network(
    client: &ArmClient,
    resource_group: &str,
    name: &str,
    address_prefixes: &[&str],
) -> Result<ResourceId> {
    let vnets = ResourceClient::new(client, "virtual-networks")?;
    let id = vnets.id(resource_group, &[], name)?;

    let request = Resource::new(VirtualNetworkProperties {
        address_space: AddressSpace {
            address_prefixes: address_prefixes.iter().map(|p| p.to_string()).collect(),
        },
        provisioning_state: None,
    });

    let created = vnets.create_or_update_typed(&id, &request).await?;
    created_id(&created, id)
}

pub async fn get_virtual_network(
    client: &ArmClient,
    id: &ResourceId,
) -> Result<Resource<VirtualNetworkProperties>> {
    ResourceClient::new(client, "virtual-networks")?
        .get_typed(id)
        .await
}

pub async fn update_virtual_network_tags(
    client: &ArmClient,
    id: &ResourceId,
    tags: &BTreeMap<String, String>,
) -> Result<Value> {
    ResourceClient::new(client, "virtual-networks")?
        .update_tags(id, tags)
        .await
}

pub async fn delete_virtual_network(client: &ArmClient, id: &ResourceId) -> Result<()> {
    ResourceClient::new(client, "virtual-networks")?
        .delete(id)
        .await
}

/// Create a subnet inside `vnet` and wait for it
pub async fn create_subnet(
    client: &ArmClient,
    vnet: &ResourceId,
    name: &str,
    address_prefix: &str,
) -> Result<ResourceId> {
    let subnets = ResourceClient::new(client, "subnets")?;
    let id = vnet.child("subnets", name);

    let request = Resource::new(SubnetProperties {
        address_prefix: Some(address_prefix.to_string()),
        provisioning_state: None,
    });

    let created = subnets.create_or_update_typed(&id, &request).await?;
    created_id(&created, id)
}

pub async fn list_subnets(client: &ArmClient, vnet: &ResourceId) -> Result<Vec<Value>> {
    ResourceClient::new(client, "subnets")?
        .list(vnet.resource_group(), &[vnet.name()])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_virtual_network_body() {
        let request = Resource::new(VirtualNetworkProperties {
            address_space: AddressSpace {
                address_prefixes: vec!["10.0.0.0/16".to_string()],
            },
            provisioning_state: None,
        })
        .with_location("westus2");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "location": "westus2",
                "properties": {"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}}
            })
        );
    }

    #[test]
    fn test_subnet_response_ignores_extra_properties() {
        let subnet: Resource<SubnetProperties> = serde_json::from_value(json!({
            "name": "default",
            "properties": {
                "addressPrefix": "10.0.0.0/24",
                "provisioningState": "Updating",
                "privateEndpointNetworkPolicies": "Disabled"
            }
        }))
        .unwrap();

        assert_eq!(subnet.properties.address_prefix.as_deref(), Some("10.0.0.0/24"));
        assert_eq!(subnet.properties.provisioning_state.as_deref(), Some("Updating"));
    }
}
