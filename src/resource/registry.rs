//! Resource Registry - Load resource definitions from JSON
//!
//! All supported `Microsoft.Network` resource types are described in
//! embedded JSON, so adding a type is a data change rather than a new
//! wrapper module.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/network.json")];

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: usize,
}

fn default_true() -> bool {
    true
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Resource provider namespace, e.g. `Microsoft.Network`
    pub provider: String,
    /// Type names from the top-level type down to this one,
    /// e.g. `["virtualNetworks", "subnets"]`
    pub type_path: Vec<String>,
    pub api_version: String,
    /// Supports a tags-only PATCH
    #[serde(default)]
    pub tags_update: bool,
    /// Can be listed across the whole subscription
    #[serde(default)]
    pub list_by_subscription: bool,
    /// Carries a top-level `location`; child resources do not
    #[serde(default = "default_true")]
    pub has_location: bool,
    /// Location forced for this type (e.g. `global` for private DNS)
    #[serde(default)]
    pub fixed_location: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl ResourceDef {
    /// Full ARM type, e.g. `Microsoft.Network/virtualNetworks/subnets`
    pub fn resource_type(&self) -> String {
        format!("{}/{}", self.provider, self.type_path.join("/"))
    }

    /// Number of parent resource names needed to address this type
    pub fn parent_depth(&self) -> usize {
        self.type_path.len().saturating_sub(1)
    }

    pub fn is_child(&self) -> bool {
        self.parent_depth() > 0
    }

    /// Columns for tabular output, falling back to the shared defaults
    pub fn columns(&self) -> &[ColumnDef] {
        if self.columns.is_empty() {
            &get_registry().default_columns
        } else {
            &self.columns
        }
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub default_columns: Vec<ColumnDef>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            default_columns: Vec::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            if final_config.default_columns.is_empty() {
                final_config.default_columns = partial.default_columns;
            }
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

/// Find the definition for a full ARM type (case-insensitive)
pub fn find_by_type(resource_type: &str) -> Option<(&'static str, &'static ResourceDef)> {
    get_registry()
        .resources
        .iter()
        .find(|(_, def)| def.resource_type().eq_ignore_ascii_case(resource_type))
        .map(|(key, def)| (key.as_str(), def))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
        assert!(!registry.default_columns.is_empty());
    }

    #[test]
    fn test_virtual_networks_resource_exists() {
        let resource = get_resource("virtual-networks").expect("virtual networks should exist");
        assert_eq!(resource.display_name, "Virtual Networks");
        assert_eq!(resource.resource_type(), "Microsoft.Network/virtualNetworks");
        assert!(resource.tags_update);
        assert!(!resource.is_child());
    }

    #[test]
    fn test_child_resources_have_no_location() {
        let subnets = get_resource("subnets").expect("subnets should exist");
        assert_eq!(subnets.parent_depth(), 1);
        assert!(!subnets.has_location);
        assert!(!subnets.list_by_subscription);
    }

    #[test]
    fn test_find_by_type_ignores_case() {
        let (key, _) = find_by_type("microsoft.network/VIRTUALNETWORKS/subnets").unwrap();
        assert_eq!(key, "subnets");
        assert!(find_by_type("Microsoft.Compute/virtualMachines").is_none());
    }

    #[test]
    fn test_every_definition_is_addressable() {
        for key in get_all_resource_keys() {
            let def = get_resource(key).unwrap();
            assert!(!def.type_path.is_empty(), "{} has no type path", key);
            assert!(!def.api_version.is_empty(), "{} has no api-version", key);
            assert!(!def.columns().is_empty(), "{} has no columns", key);
        }
    }

    #[test]
    fn test_private_dns_is_global() {
        let zones = get_resource("private-dns-zones").unwrap();
        assert_eq!(zones.fixed_location.as_deref(), Some("global"));
        assert_eq!(zones.api_version, "2020-06-01");
    }
}
