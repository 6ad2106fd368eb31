//! Typed wire representation shared by all ARM resources

use super::id::ResourceId;
use crate::error::{ArmError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The common ARM resource envelope with type-specific `properties`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource<P = Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub properties: P,
}

/// Pricing tier of resources that carry one (public IPs, load balancers, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

impl<P> Resource<P> {
    pub fn new(properties: P) -> Self {
        Self {
            id: None,
            name: None,
            resource_type: None,
            location: None,
            tags: BTreeMap::new(),
            etag: None,
            sku: None,
            properties,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_sku(mut self, name: &str) -> Self {
        self.sku = Some(Sku {
            name: name.to_string(),
            tier: None,
        });
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Parsed `id` of a resource returned by the control plane
    pub fn resource_id(&self) -> Result<ResourceId> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| ArmError::InvalidResponse("Resource has no id".to_string()))?;
        ResourceId::parse(id)
    }
}

/// Reference to another resource by ID, as embedded in request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

impl From<&ResourceId> for SubResource {
    fn from(id: &ResourceId) -> Self {
        Self { id: id.to_string() }
    }
}

/// Body of a tags-only PATCH
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagsObject {
    pub tags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_omits_empty_fields() {
        let resource = Resource::new(json!({"addressPrefix": "10.0.0.0/24"}));
        let body = serde_json::to_value(&resource).unwrap();
        assert_eq!(body, json!({"properties": {"addressPrefix": "10.0.0.0/24"}}));
    }

    #[test]
    fn test_response_with_unknown_fields() {
        let resource: Resource = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/g/providers/Microsoft.Network/publicIPAddresses/ip",
            "name": "ip",
            "type": "Microsoft.Network/publicIPAddresses",
            "location": "westus2",
            "sku": {"name": "Standard"},
            "properties": {"provisioningState": "Succeeded"}
        }))
        .unwrap();

        assert_eq!(resource.resource_type.as_deref(), Some("Microsoft.Network/publicIPAddresses"));
        assert_eq!(resource.sku.as_ref().map(|s| s.name.as_str()), Some("Standard"));
        assert_eq!(resource.resource_id().unwrap().name(), "ip");
    }

    #[test]
    fn test_missing_id_is_invalid_response() {
        let resource: Resource = Resource::new(Value::Null);
        assert!(matches!(resource.resource_id(), Err(ArmError::InvalidResponse(_))));
    }
}
