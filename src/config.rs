//! Configuration Management
//!
//! Persistent settings for armnet, stored as JSON under the user's config
//! directory. Every field can be overridden from the environment, and the
//! binary's flags override both.

use crate::azure::client::ClientOptions;
use crate::azure::lro::PollerOptions;
use crate::error::{ArmError, Result as ArmResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUBSCRIPTION_ENV: &str = "AZURE_SUBSCRIPTION_ID";
pub const RESOURCE_GROUP_ENV: &str = "AZURE_RESOURCE_GROUP";
pub const LOCATION_ENV: &str = "AZURE_LOCATION";
pub const ENDPOINT_ENV: &str = "ARM_ENDPOINT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Resource group used when a command doesn't name one
    #[serde(default)]
    pub resource_group: Option<String>,
    /// Location filled into create requests that omit it
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Poll loop settings, in whole seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub respect_retry_after: bool,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    3600
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            respect_retry_after: false,
        }
    }
}

impl PollingConfig {
    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions::default()
            .with_interval(Duration::from_secs(self.interval_secs))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry_after(self.respect_retry_after)
    }
}

impl Config {
    /// Default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armnet").join("config.json"))
    }

    /// Load configuration from the default path
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults if it is
    /// missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective subscription (config > environment)
    pub fn effective_subscription(&self) -> Option<String> {
        self.subscription_id.clone().or_else(|| env_var(SUBSCRIPTION_ENV))
    }

    /// Get effective resource group (config > environment)
    pub fn effective_resource_group(&self) -> Option<String> {
        self.resource_group
            .clone()
            .or_else(|| env_var(RESOURCE_GROUP_ENV))
    }

    /// Get effective location (config > environment)
    pub fn effective_location(&self) -> Option<String> {
        self.location.clone().or_else(|| env_var(LOCATION_ENV))
    }

    /// Get effective endpoint (config > environment > public cloud)
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .or_else(|| env_var(ENDPOINT_ENV))
            .unwrap_or_else(|| crate::azure::client::DEFAULT_ENDPOINT.to_string())
    }

    /// Build client options, validating the subscription ID
    pub fn client_options(&self) -> ArmResult<ClientOptions> {
        let subscription = self.effective_subscription().ok_or_else(|| {
            ArmError::Config(format!(
                "No subscription configured; set {} or pass --subscription",
                SUBSCRIPTION_ENV
            ))
        })?;

        uuid::Uuid::parse_str(&subscription).map_err(|_| {
            ArmError::Config(format!(
                "Subscription ID '{}' is not a GUID",
                subscription
            ))
        })?;

        let mut options = ClientOptions::new(&subscription)
            .with_endpoint(&self.effective_endpoint())
            .with_poller(self.polling.poller_options());
        if let Some(location) = self.effective_location() {
            options = options.with_location(&location);
        }
        Ok(options)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
