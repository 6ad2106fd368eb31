//! Property-based tests using proptest
//!
//! These tests verify resource ID parsing and formatting, status parsing,
//! and JSON path extraction using randomized inputs.

use armnet::resource::extract_json_value;
use armnet::{OperationStatus, ResourceId};
use proptest::prelude::*;
use serde_json::json;

/// Generate a resource name as ARM allows them (no slashes)
fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9._-]{0,40}"
}

/// Generate a resource ID with up to two levels of children
fn arb_resource_id() -> impl Strategy<Value = ResourceId> {
    (
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        arb_name(),
        prop_oneof!["virtualNetworks", "routeTables", "networkSecurityGroups"],
        arb_name(),
        prop::collection::vec(
            (prop_oneof!["subnets", "routes", "securityRules"], arb_name()),
            0..3,
        ),
    )
        .prop_map(|(sub, group, resource_type, name, children)| {
            children.iter().fold(
                ResourceId::new(&sub, &group, "Microsoft.Network", &resource_type, &name),
                |id, (child_type, child_name)| id.child(child_type, child_name),
            )
        })
}

proptest! {
    #[test]
    fn display_then_parse_is_identity(id in arb_resource_id()) {
        let parsed = ResourceId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn child_parent_relation(id in arb_resource_id(), name in arb_name()) {
        let child = id.child("subnets", &name);
        prop_assert_eq!(child.parent(), Some(id.clone()));
        prop_assert_eq!(child.name(), name.as_str());
        prop_assert_eq!(child.subscription_id(), id.subscription_id());
        prop_assert!(child.resource_type().ends_with("/subnets"));
    }

    #[test]
    fn keywords_are_case_insensitive(id in arb_resource_id()) {
        let shouted = id
            .to_string()
            .replacen("/subscriptions/", "/SUBSCRIPTIONS/", 1)
            .replacen("/resourceGroups/", "/resourcegroups/", 1)
            .replacen("/providers/", "/Providers/", 1);
        let parsed = ResourceId::parse(&shouted).unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn dangling_type_is_rejected(id in arb_resource_id()) {
        let broken = format!("{}/subnets", id);
        prop_assert!(ResourceId::parse(&broken).is_err());
    }

    #[test]
    fn parse_never_panics(input in "\\PC{0,200}") {
        let _ = ResourceId::parse(&input);
    }
}

mod status_tests {
    use super::*;

    proptest! {
        #[test]
        fn terminal_states_ignore_case(
            state in prop_oneof!["succeeded", "failed", "canceled", "cancelled"],
            mask in prop::collection::vec(any::<bool>(), 9)
        ) {
            let mixed: String = state
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();
            let status = OperationStatus::parse(&mixed);
            prop_assert!(status.is_terminal());
            prop_assert_eq!(status, OperationStatus::parse(&state));
        }

        #[test]
        fn unknown_states_are_in_progress(state in "[A-Za-z]{1,20}") {
            let lower = state.to_ascii_lowercase();
            prop_assume!(!["succeeded", "failed", "canceled", "cancelled"].contains(&lower.as_str()));
            prop_assert_eq!(OperationStatus::parse(&state), OperationStatus::InProgress);
        }
    }
}

mod json_path_tests {
    use super::*;

    proptest! {
        #[test]
        fn nested_string_is_extracted(name in arb_name(), state in "[A-Za-z]{1,12}") {
            let item = json!({"name": name, "properties": {"provisioningState": state}});
            prop_assert_eq!(extract_json_value(&item, "name"), name);
            prop_assert_eq!(extract_json_value(&item, "properties.provisioningState"), state);
        }

        #[test]
        fn missing_path_is_dash(name in arb_name()) {
            let item = json!({"name": name});
            prop_assert_eq!(extract_json_value(&item, "properties.addressSpace"), "-");
        }
    }
}
