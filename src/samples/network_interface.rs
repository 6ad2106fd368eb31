//! Public IP addresses and network interfaces

use super::created_id;
use crate::azure::client::ArmClient;
use crate::error::Result;
use crate::resource::{Resource, ResourceClient, ResourceId, SubResource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicIpAddressProperties {
    #[serde(
        rename = "publicIPAllocationMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allocation_method: Option<String>,
    #[serde(rename = "ipAddress", default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(
        rename = "provisioningState",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpConfigurationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(rename = "privateIPAllocationMethod", default = "dynamic")]
    pub private_allocation_method: String,
    #[serde(rename = "privateIPAddress", default, skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(rename = "publicIPAddress", default, skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,
}

fn dynamic() -> String {
    "Dynamic".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Create a static Standard SKU public IP address and wait for it
pub async fn create_public_ip_address(
    client: &ArmClient,
    resource_group: &str,
    name: &str,
) -> Result<ResourceId> {
    let public_ips = ResourceClient::new(client, "public-ip-addresses")?;
    let id = public_ips.id(resource_group, &[], name)?;

    let request = Resource::new(PublicIpAddressProperties {
        allocation_method: Some("Static".to_string()),
        ..Default::default()
    })
    .with_sku("Standard");

    let created = public_ips.create_or_update_typed(&id, &request).await?;
    created_id(&created, id)
}

pub async fn delete_public_ip_address(client: &ArmClient, id: &ResourceId) -> Result<()> {
    ResourceClient::new(client, "public-ip-addresses")?
        .delete(id)
        .await
}

/// Create a NIC attached to `subnet`, optionally with a public IP
pub async fn create_network_interface(
    client: &ArmClient,
    resource_group: &str,
    name: &str,
    subnet: &ResourceId,
    public_ip: Option<&ResourceId>,
) -> Result<ResourceId> {
    let nics = ResourceClient::new(client, "network-interfaces")?;
    let id = nics.id(resource_group, &[], name)?;

    let request = Resource::new(NetworkInterfaceProperties {
        ip_configurations: vec![IpConfiguration {
            name: "ipconfig1".to_string(),
            properties: IpConfigurationProperties {
                subnet: Some(SubResource::from(subnet)),
                private_allocation_method: dynamic(),
                private_ip_address: None,
                public_ip_address: public_ip.map(SubResource::from),
            },
        }],
        provisioning_state: None,
    });

    let created = nics.create_or_update_typed(&id, &request).await?;
    created_id(&created, id)
}

pub async fn get_network_interface(
    client: &ArmClient,
    id: &ResourceId,
) -> Result<Resource<NetworkInterfaceProperties>> {
    ResourceClient::new(client, "network-interfaces")?
        .get_typed(id)
        .await
}

pub async fn delete_network_interface(client: &ArmClient, id: &ResourceId) -> Result<()> {
    ResourceClient::new(client, "network-interfaces")?
        .delete(id)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ip_configuration_wire_names() {
        let subnet = ResourceId::parse(
            "/subscriptions/s/resourceGroups/g/providers/Microsoft.Network/virtualNetworks/v/subnets/default",
        )
        .unwrap();
        let config = IpConfigurationProperties {
            subnet: Some(SubResource::from(&subnet)),
            private_allocation_method: dynamic(),
            private_ip_address: None,
            public_ip_address: None,
        };

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "subnet": {"id": subnet.to_string()},
                "privateIPAllocationMethod": "Dynamic"
            })
        );
    }

    #[test]
    fn test_public_ip_response_decodes() {
        let ip: Resource<PublicIpAddressProperties> = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/g/providers/Microsoft.Network/publicIPAddresses/ip",
            "sku": {"name": "Standard", "tier": "Regional"},
            "properties": {
                "publicIPAllocationMethod": "Static",
                "ipAddress": "20.1.2.3",
                "provisioningState": "Succeeded",
                "idleTimeoutInMinutes": 4
            }
        }))
        .unwrap();

        assert_eq!(ip.properties.ip_address.as_deref(), Some("20.1.2.3"));
        assert_eq!(ip.properties.allocation_method.as_deref(), Some("Static"));
    }

    #[test]
    fn test_nic_without_ip_configurations_decodes() {
        let nic: Resource<NetworkInterfaceProperties> =
            serde_json::from_value(json!({"properties": {}})).unwrap();
        assert!(nic.properties.ip_configurations.is_empty());
    }
}
