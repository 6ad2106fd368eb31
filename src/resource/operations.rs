//! Generic CRUD operations for registered resource types
//!
//! Every network resource type exposes the same operation shape; a
//! [`ResourceClient`] binds an [`ArmClient`] to one [`ResourceDef`] and
//! provides it.

use super::fetcher;
use super::id::ResourceId;
use super::model::{Resource, TagsObject};
use super::registry::{get_resource, ResourceDef};
use crate::azure::client::ArmClient;
use crate::azure::lro::{Operation, PollerOptions};
use crate::error::{ArmError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Client for one resource collection
#[derive(Clone)]
pub struct ResourceClient {
    client: ArmClient,
    def: &'static ResourceDef,
}

impl ResourceClient {
    /// Bind `client` to the resource type registered under `resource_key`
    pub fn new(client: &ArmClient, resource_key: &str) -> Result<Self> {
        let def = get_resource(resource_key)
            .ok_or_else(|| ArmError::UnknownResourceType(resource_key.to_string()))?;
        Ok(Self::for_definition(client, def))
    }

    pub fn for_definition(client: &ArmClient, def: &'static ResourceDef) -> Self {
        Self {
            client: client.clone(),
            def,
        }
    }

    pub fn definition(&self) -> &'static ResourceDef {
        self.def
    }

    /// Identifier of a resource of this type in the client's subscription
    ///
    /// `parents` names the enclosing resources for child types, e.g. the
    /// virtual network name for a subnet.
    pub fn id(&self, resource_group: &str, parents: &[&str], name: &str) -> Result<ResourceId> {
        let depth = self.def.parent_depth();
        if parents.len() != depth {
            return Err(ArmError::InvalidResourceId {
                id: name.to_string(),
                reason: format!(
                    "{} needs {} parent name(s), got {}",
                    self.def.resource_type(),
                    depth,
                    parents.len()
                ),
            });
        }

        let mut id = ResourceId::new(
            self.client.subscription_id(),
            resource_group,
            &self.def.provider,
            &self.def.type_path[0],
            parents.first().copied().unwrap_or(name),
        );
        for (i, resource_type) in self.def.type_path.iter().enumerate().skip(1) {
            let segment_name = parents.get(i).copied().unwrap_or(name);
            id = id.child(resource_type, segment_name);
        }
        Ok(id)
    }

    /// Get a single resource
    pub async fn get(&self, id: &ResourceId) -> Result<Value> {
        let url = self.url_for(id)?;
        self.client.get(&url).await
    }

    /// Get a single resource as a typed [`Resource`]
    pub async fn get_typed<P: DeserializeOwned + Default>(
        &self,
        id: &ResourceId,
    ) -> Result<Resource<P>> {
        decode(self.get(id).await?)
    }

    /// List resources in a resource group (or under the given parents)
    pub async fn list(&self, resource_group: &str, parents: &[&str]) -> Result<Vec<Value>> {
        let depth = self.def.parent_depth();
        if parents.len() != depth {
            return Err(ArmError::InvalidResourceId {
                id: resource_group.to_string(),
                reason: format!(
                    "listing {} needs {} parent name(s), got {}",
                    self.def.resource_type(),
                    depth,
                    parents.len()
                ),
            });
        }

        let mut path = format!("providers/{}", self.def.provider);
        for (i, resource_type) in self.def.type_path.iter().enumerate() {
            path.push('/');
            path.push_str(resource_type);
            if let Some(parent) = parents.get(i) {
                path.push('/');
                path.push_str(&urlencoding::encode(parent));
            }
        }

        let url = self
            .client
            .resource_group_url(resource_group, &path, &self.def.api_version)?;
        fetcher::fetch_all(&self.client, &url).await
    }

    /// List resources of this type across the subscription
    pub async fn list_all(&self) -> Result<Vec<Value>> {
        if !self.def.list_by_subscription {
            return Err(ArmError::Config(format!(
                "{} cannot be listed across a subscription",
                self.def.resource_type()
            )));
        }

        let url = self.client.subscription_url(
            &format!("providers/{}", self.def.resource_type()),
            &self.def.api_version,
        )?;
        fetcher::fetch_all(&self.client, &url).await
    }

    /// Submit a create/update and return the operation handle
    pub async fn begin_create_or_update(&self, id: &ResourceId, body: &Value) -> Result<Operation> {
        let url = self.url_for(id)?;
        let body = self.prepare_body(body)?;
        tracing::info!("Creating or updating {}", id);
        self.client.begin(Method::PUT, &url, Some(&body)).await
    }

    /// Create or update and wait with the client's default poller settings
    pub async fn create_or_update(&self, id: &ResourceId, body: &Value) -> Result<Value> {
        self.create_or_update_with(id, body, self.client.poller_options(), None)
            .await
    }

    /// Create or update and wait with explicit poller settings
    pub async fn create_or_update_with(
        &self,
        id: &ResourceId,
        body: &Value,
        options: &PollerOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        let operation = self.begin_create_or_update(id, body).await?;
        operation
            .wait_with_cancel(options, cancel)
            .await?
            .ok_or_else(|| {
                ArmError::InvalidResponse(format!("No resource returned for {}", id))
            })
    }

    /// Create or update from a typed [`Resource`]
    pub async fn create_or_update_typed<P>(
        &self,
        id: &ResourceId,
        resource: &Resource<P>,
    ) -> Result<Resource<P>>
    where
        P: Serialize + DeserializeOwned + Default,
    {
        let body = serde_json::to_value(resource)
            .map_err(|e| ArmError::InvalidRequest(format!("Failed to encode request: {}", e)))?;
        decode(self.create_or_update(id, &body).await?)
    }

    /// Submit a delete and return the operation handle
    pub async fn begin_delete(&self, id: &ResourceId) -> Result<Operation> {
        let url = self.url_for(id)?;
        tracing::info!("Deleting {}", id);
        self.client.begin(Method::DELETE, &url, None).await
    }

    /// Delete and wait with the client's default poller settings
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.delete_with(id, self.client.poller_options(), None).await
    }

    pub async fn delete_with(
        &self,
        id: &ResourceId,
        options: &PollerOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        self.begin_delete(id)
            .await?
            .wait_with_cancel(options, cancel)
            .await?;
        Ok(())
    }

    /// Replace the tags of a resource with a single PATCH
    pub async fn update_tags(
        &self,
        id: &ResourceId,
        tags: &BTreeMap<String, String>,
    ) -> Result<Value> {
        if !self.def.tags_update {
            return Err(ArmError::Config(format!(
                "{} does not support tag updates",
                self.def.resource_type()
            )));
        }

        let url = self.url_for(id)?;
        let body = serde_json::to_value(TagsObject { tags: tags.clone() })
            .map_err(|e| ArmError::InvalidRequest(format!("Failed to encode tags: {}", e)))?;
        tracing::info!("Updating tags on {}", id);
        self.client.patch(&url, &body).await
    }

    fn url_for(&self, id: &ResourceId) -> Result<String> {
        let expected = self.def.resource_type();
        if !id.resource_type().eq_ignore_ascii_case(&expected) {
            return Err(ArmError::InvalidResourceId {
                id: id.to_string(),
                reason: format!("expected a {} ID", expected),
            });
        }
        self.client.resource_url(id, &self.def.api_version)
    }

    /// Fill in the location for located types when the caller left it out
    fn prepare_body(&self, body: &Value) -> Result<Value> {
        let mut body = body.clone();
        if !self.def.has_location {
            return Ok(body);
        }

        let Value::Object(ref mut map) = body else {
            return Err(ArmError::InvalidRequest(
                "request body must be a JSON object".to_string(),
            ));
        };

        let location = self
            .def
            .fixed_location
            .as_deref()
            .or_else(|| self.client.location());

        if let Some(location) = location {
            map.entry("location")
                .or_insert_with(|| Value::String(location.to_string()));
        }
        Ok(body)
    }
}

fn decode<P: DeserializeOwned + Default>(value: Value) -> Result<Resource<P>> {
    serde_json::from_value(value)
        .map_err(|e| ArmError::InvalidResponse(format!("Unexpected resource shape: {}", e)))
}
