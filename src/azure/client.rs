//! ARM Client
//!
//! Main client for the Azure Resource Manager control plane, combining
//! authentication, the HTTP transport and the default poller settings.
//! Construct one per process and clone it freely; clones share the
//! connection pool and the token cache.

use super::auth::{Credentials, TokenCredential};
use super::http::{ArmHttpClient, HttpResponse};
use super::lro::{Operation, PollerOptions};
use crate::error::{ArmError, Result};
use crate::resource::ResourceId;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Public Azure cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Settings fixed for the lifetime of a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Management endpoint, e.g. `https://management.azure.com`
    pub endpoint: String,
    /// Subscription used when building resource IDs
    pub subscription_id: String,
    /// Default region for created resources
    pub location: Option<String>,
    /// Default poller settings for `create_or_update`/`delete`
    pub poller: PollerOptions,
    pub user_agent: String,
}

impl ClientOptions {
    pub fn new(subscription_id: &str) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            subscription_id: subscription_id.to_string(),
            location: None,
            poller: PollerOptions::default(),
            user_agent: format!("armnet/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_poller(mut self, poller: PollerOptions) -> Self {
        self.poller = poller;
        self
    }
}

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    credentials: Credentials,
    http: ArmHttpClient,
    options: Arc<ClientOptions>,
}

impl ArmClient {
    /// Create a new ARM client
    pub fn new(options: ClientOptions, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        Url::parse(&options.endpoint)
            .map_err(|e| ArmError::Config(format!("Invalid endpoint '{}': {}", options.endpoint, e)))?;

        let http = ArmHttpClient::new(&options.user_agent)?;

        Ok(Self {
            credentials: Credentials::new(credential),
            http,
            options: Arc::new(options),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.options.subscription_id
    }

    pub fn location(&self) -> Option<&str> {
        self.options.location.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    /// Default poller settings
    pub fn poller_options(&self) -> &PollerOptions {
        &self.options.poller
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a management URL from an absolute path and an API version
    pub fn url(&self, path: &str, api_version: &str) -> Result<String> {
        let raw = format!("{}{}", self.options.endpoint.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ArmError::Config(format!("Invalid URL '{}': {}", raw, e)))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.to_string())
    }

    /// Build the URL of a single resource
    pub fn resource_url(&self, id: &ResourceId, api_version: &str) -> Result<String> {
        self.url(&id.to_url_path(), api_version)
    }

    /// Build a subscription-scoped URL
    pub fn subscription_url(&self, path: &str, api_version: &str) -> Result<String> {
        self.url(
            &format!(
                "/subscriptions/{}/{}",
                urlencoding::encode(self.subscription_id()),
                path.trim_start_matches('/')
            ),
            api_version,
        )
    }

    /// Build a resource-group-scoped URL
    pub fn resource_group_url(
        &self,
        resource_group: &str,
        path: &str,
        api_version: &str,
    ) -> Result<String> {
        self.subscription_url(
            &format!(
                "resourceGroups/{}/{}",
                urlencoding::encode(resource_group),
                path.trim_start_matches('/')
            ),
            api_version,
        )
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Issue one authenticated request
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        let token = self.credentials.get_token().await?;
        self.http.send(method, url, &token, body).await
    }

    /// GET a resource or collection
    pub async fn get(&self, url: &str) -> Result<Value> {
        Ok(self.request(Method::GET, url, None).await?.body)
    }

    /// PATCH a resource, single round-trip
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        Ok(self.request(Method::PATCH, url, Some(body)).await?.body)
    }

    /// Submit a mutating request and return its operation handle
    ///
    /// The handle is already complete when the control plane finished the
    /// request synchronously.
    pub async fn begin(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Operation> {
        Operation::begin(self, method, url, body).await
    }
}
