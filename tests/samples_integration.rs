//! Integration tests for the typed sample helpers using wiremock
//!
//! Each create returns the ID the control plane reports, and that ID is
//! what dependent requests embed.

use armnet::samples::{
    create_network_interface, create_public_ip_address, create_route, create_route_table,
    create_subnet, create_virtual_network, get_network_interface, list_subnets, NextHop,
};
use armnet::{ArmClient, ClientOptions, PollerOptions, StaticTokenCredential};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SUB: &str = "00000000-0000-0000-0000-000000000001";
const RG: &str = "/subscriptions/00000000-0000-0000-0000-000000000001/resourceGroups/rg-net";

fn client_for(server: &MockServer) -> ArmClient {
    let options = ClientOptions::new(SUB)
        .with_endpoint(&server.uri())
        .with_location("westus2")
        .with_poller(PollerOptions::default().with_interval(Duration::from_millis(10)));
    ArmClient::new(options, Arc::new(StaticTokenCredential::new("test-token")))
        .expect("client should build")
}

/// Echo a PUT body back as a finished resource with the request path as its ID
struct EchoCreated;

impl Respond for EchoCreated {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body: Value = serde_json::from_slice(&request.body).unwrap_or(json!({}));
        let id = request.url.path().to_string();
        let name = id.rsplit('/').next().unwrap_or_default().to_string();
        body["id"] = json!(id);
        body["name"] = json!(name);
        body["properties"]["provisioningState"] = json!("Succeeded");
        ResponseTemplate::new(200).set_body_json(body)
    }
}

#[tokio::test]
async fn test_vnet_subnet_nic_chain() {
    let server = MockServer::start().await;
    let vnet_path = format!("{}/providers/Microsoft.Network/virtualNetworks/vnet-a", RG);
    let subnet_path = format!("{}/subnets/default", vnet_path);
    let pip_path = format!("{}/providers/Microsoft.Network/publicIPAddresses/pip-a", RG);
    let nic_path = format!("{}/providers/Microsoft.Network/networkInterfaces/nic-a", RG);

    Mock::given(method("PUT"))
        .and(path(vnet_path.as_str()))
        .and(body_partial_json(json!({
            "location": "westus2",
            "properties": {"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}}
        })))
        .respond_with(EchoCreated)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(subnet_path.as_str()))
        .and(body_partial_json(json!({"properties": {"addressPrefix": "10.0.0.0/24"}})))
        .respond_with(EchoCreated)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(pip_path.as_str()))
        .and(body_partial_json(json!({
            "sku": {"name": "Standard"},
            "properties": {"publicIPAllocationMethod": "Static"}
        })))
        .respond_with(EchoCreated)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(nic_path.as_str()))
        .and(body_partial_json(json!({
            "properties": {"ipConfigurations": [{
                "name": "ipconfig1",
                "properties": {
                    "subnet": {"id": subnet_path},
                    "publicIPAddress": {"id": pip_path},
                    "privateIPAllocationMethod": "Dynamic"
                }
            }]}
        })))
        .respond_with(EchoCreated)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let vnet = create_virtual_network(&client, "rg-net", "vnet-a", &["10.0.0.0/16"])
        .await
        .unwrap();
    assert_eq!(vnet.to_string(), vnet_path);

    let subnet = create_subnet(&client, &vnet, "default", "10.0.0.0/24")
        .await
        .unwrap();
    assert_eq!(subnet.parent(), Some(vnet.clone()));

    let pip = create_public_ip_address(&client, "rg-net", "pip-a").await.unwrap();
    let nic = create_network_interface(&client, "rg-net", "nic-a", &subnet, Some(&pip))
        .await
        .unwrap();

    assert_eq!(nic.name(), "nic-a");
    assert_eq!(nic.resource_type(), "Microsoft.Network/networkInterfaces");
}

#[tokio::test]
async fn test_get_network_interface_typed() {
    let server = MockServer::start().await;
    let nic_path = format!("{}/providers/Microsoft.Network/networkInterfaces/nic-a", RG);

    Mock::given(method("GET"))
        .and(path(nic_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": nic_path,
            "name": "nic-a",
            "properties": {
                "provisioningState": "Succeeded",
                "ipConfigurations": [{
                    "name": "ipconfig1",
                    "properties": {
                        "privateIPAddress": "10.0.0.4",
                        "privateIPAllocationMethod": "Dynamic",
                        "subnet": {"id": format!("{}/providers/Microsoft.Network/virtualNetworks/vnet-a/subnets/default", RG)}
                    }
                }]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let id = armnet::ResourceId::parse(&nic_path).unwrap();
    let nic = get_network_interface(&client, &id).await.unwrap();

    let config = &nic.properties.ip_configurations[0];
    assert_eq!(config.properties.private_ip_address.as_deref(), Some("10.0.0.4"));
    assert!(config.properties.public_ip_address.is_none());
}

#[tokio::test]
async fn test_route_table_with_appliance_route() {
    let server = MockServer::start().await;
    let table_path = format!("{}/providers/Microsoft.Network/routeTables/rt-a", RG);
    let route_path = format!("{}/routes/to-firewall", table_path);

    Mock::given(method("PUT"))
        .and(path(table_path.as_str()))
        .respond_with(EchoCreated)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(route_path.as_str()))
        .and(body_partial_json(json!({"properties": {
            "addressPrefix": "0.0.0.0/0",
            "nextHopType": "VirtualAppliance",
            "nextHopIpAddress": "10.0.2.4"
        }})))
        .respond_with(EchoCreated)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let table = create_route_table(&client, "rg-net", "rt-a").await.unwrap();
    let route = create_route(
        &client,
        &table,
        "to-firewall",
        "0.0.0.0/0",
        &NextHop::VirtualAppliance("10.0.2.4".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(route.to_string(), route_path);
}

#[tokio::test]
async fn test_list_subnets_of_vnet() {
    let server = MockServer::start().await;
    let vnet_path = format!("{}/providers/Microsoft.Network/virtualNetworks/vnet-a", RG);

    Mock::given(method("GET"))
        .and(path(format!("{}/subnets", vnet_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "default"}, {"name": "AzureBastionSubnet"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vnet = armnet::ResourceId::parse(&vnet_path).unwrap();
    let subnets = list_subnets(&client, &vnet).await.unwrap();
    assert_eq!(subnets.len(), 2);
}
