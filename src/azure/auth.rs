//! ARM Authentication
//!
//! Token acquisition is delegated to a [`TokenCredential`] implementation.
//! [`Credentials`] wraps one and caches the bearer token until shortly
//! before it expires.

use crate::error::{ArmError, Result};
use futures::future::{self, BoxFuture};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for Azure Resource Manager access
pub const DEFAULT_SCOPES: &[&str] = &["https://management.azure.com/.default"];

/// Environment variable read by [`EnvironmentCredential`]
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL when the credential does not report one
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// A bearer token returned by a credential
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    /// Remaining lifetime, if the credential knows it
    pub expires_in: Option<Duration>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Source of bearer tokens
pub trait TokenCredential: Send + Sync {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> BoxFuture<'a, Result<AccessToken>>;
}

/// Credential that always hands out the same token
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenCredential for StaticTokenCredential {
    fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> BoxFuture<'a, Result<AccessToken>> {
        Box::pin(future::ready(Ok(AccessToken {
            token: self.token.clone(),
            expires_in: None,
        })))
    }
}

/// Credential reading a pre-acquired token from `AZURE_ACCESS_TOKEN`
///
/// Obtain one with `az account get-access-token --query accessToken -o tsv`.
pub struct EnvironmentCredential {
    token: String,
}

impl EnvironmentCredential {
    pub fn new() -> Result<Self> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ArmError::Authentication(format!(
                    "{} is not set. Run 'az account get-access-token' and export it",
                    ACCESS_TOKEN_ENV
                ))
            })?;

        Ok(Self {
            token: token.trim().to_string(),
        })
    }
}

impl TokenCredential for EnvironmentCredential {
    fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> BoxFuture<'a, Result<AccessToken>> {
        Box::pin(future::ready(Ok(AccessToken {
            token: self.token.clone(),
            expires_in: None,
        })))
    }
}

/// Credential holder with token caching, shared by all clones of a client
#[derive(Clone)]
pub struct Credentials {
    provider: Arc<dyn TokenCredential>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl Credentials {
    pub fn new(provider: Arc<dyn TokenCredential>) -> Self {
        Self {
            provider,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = self.provider.get_token(DEFAULT_SCOPES).await.map_err(|e| match e {
            ArmError::Authentication(_) => e,
            other => ArmError::Authentication(other.to_string()),
        })?;

        let ttl = token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token.token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}
