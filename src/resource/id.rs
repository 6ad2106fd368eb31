//! ARM resource identifiers
//!
//! `/subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}[/{type}/{name}]*`

use crate::error::{ArmError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a resource-group-scoped resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: String,
    provider: String,
    /// (type, name) pairs from the top-level resource down
    segments: Vec<(String, String)>,
}

impl ResourceId {
    /// Identifier of a top-level resource
    pub fn new(
        subscription_id: &str,
        resource_group: &str,
        provider: &str,
        resource_type: &str,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            provider: provider.to_string(),
            segments: vec![(resource_type.to_string(), name.to_string())],
        }
    }

    /// Identifier of a child of this resource
    pub fn child(&self, resource_type: &str, name: &str) -> Self {
        let mut child = self.clone();
        child
            .segments
            .push((resource_type.to_string(), name.to_string()));
        child
    }

    /// Parent resource, `None` for top-level resources
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    pub fn parse(id: &str) -> Result<Self> {
        let invalid = |reason: &str| ArmError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = id.trim().strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();

        if parts.len() < 8 {
            return Err(invalid("too few segments"));
        }
        if !parts[0].eq_ignore_ascii_case("subscriptions") {
            return Err(invalid("expected 'subscriptions'"));
        }
        if !parts[2].eq_ignore_ascii_case("resourceGroups") {
            return Err(invalid("expected 'resourceGroups'"));
        }
        if !parts[4].eq_ignore_ascii_case("providers") {
            return Err(invalid("expected 'providers'"));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty segment"));
        }

        let tail = &parts[6..];
        if tail.len() % 2 != 0 {
            return Err(invalid("resource type without a name"));
        }

        let segments = tail
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            subscription_id: parts[1].to_string(),
            resource_group: parts[3].to_string(),
            provider: parts[5].to_string(),
            segments,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Name of the addressed resource
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or_default()
    }

    /// Full ARM type, e.g. `Microsoft.Network/virtualNetworks/subnets`
    pub fn resource_type(&self) -> String {
        let types: Vec<&str> = self.segments.iter().map(|(t, _)| t.as_str()).collect();
        format!("{}/{}", self.provider, types.join("/"))
    }

    /// Names of the enclosing resources, outermost first
    pub fn parent_names(&self) -> Vec<&str> {
        let count = self.segments.len().saturating_sub(1);
        self.segments[..count]
            .iter()
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Percent-encoded URL path for this resource
    pub fn to_url_path(&self) -> String {
        let mut path = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            urlencoding::encode(&self.subscription_id),
            urlencoding::encode(&self.resource_group),
            self.provider
        );
        for (resource_type, name) in &self.segments {
            path.push('/');
            path.push_str(resource_type);
            path.push('/');
            path.push_str(&urlencoding::encode(name));
        }
        path
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id, self.resource_group, self.provider
        )?;
        for (resource_type, name) in &self.segments {
            write!(f, "/{}/{}", resource_type, name)?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = ArmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
