//! Long-running operations
//!
//! A mutating ARM request either completes synchronously or is accepted and
//! finishes in the background. [`Operation`] is the handle for the latter:
//! it knows which status monitor to poll and turns the terminal state into
//! either the resulting resource or an [`ArmError`].
//!
//! Three monitors are recognised, in order of preference:
//!
//! - `Azure-AsyncOperation` header: a status document `{"status": ...}`
//! - `Location` header on a 202: keeps answering 202 until done, then
//!   returns the result
//! - `properties.provisioningState` of the resource body itself
//!
//! ```text
//! Submitted --> InProgress --+--> Succeeded
//!                 ^    |     |
//!                 +----+     +--> Failed / Canceled (or deadline)
//! ```

use super::client::ArmClient;
use super::http::HttpResponse;
use crate::error::{extract_error_detail, ArmError, Result};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
pub const LOCATION_HEADER: &str = "location";

/// Default interval between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default wait deadline; gateway provisioning regularly takes 30+ minutes
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Stand-in deadline for timeouts too large to add to an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Status of a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Parse a status or provisioning state, case-insensitively
    ///
    /// Anything that is not a known terminal state (`Accepted`, `Creating`,
    /// `Updating`, `Deleting`, ...) counts as in progress.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long to wait and how often to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerOptions {
    /// Fixed delay between polls
    pub interval: Duration,
    /// Deadline for the whole wait, measured from its start
    pub timeout: Duration,
    /// Let a longer `Retry-After` from the server stretch the interval
    pub respect_retry_after: bool,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            respect_retry_after: false,
        }
    }
}

impl PollerOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }
}

/// Where the status of an accepted operation is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollingMethod {
    AsyncOperation(String),
    Location(String),
    ResourceBody(String),
}

impl PollingMethod {
    pub fn url(&self) -> &str {
        match self {
            Self::AsyncOperation(url) | Self::Location(url) | Self::ResourceBody(url) => url,
        }
    }
}

/// Handle to a submitted mutating request
pub struct Operation {
    client: ArmClient,
    method: Method,
    resource_url: String,
    polling: Option<PollingMethod>,
    status: OperationStatus,
    body: Value,
    failure: Option<(String, String)>,
    retry_after: Option<Duration>,
    poll_count: u32,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("resource_url", &self.resource_url)
            .field("polling", &self.polling)
            .field("status", &self.status)
            .field("poll_count", &self.poll_count)
            .finish()
    }
}

impl Operation {
    /// Submit the request and classify the initial response
    pub(crate) async fn begin(
        client: &ArmClient,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Self> {
        let response = client.request(method.clone(), url, body).await?;
        let operation = Self::from_initial_response(client.clone(), method, url, response)?;

        match &operation.polling {
            Some(polling) => tracing::info!(
                "{} {} accepted, polling {:?}",
                operation.method,
                operation.resource_url,
                polling
            ),
            None => tracing::info!(
                "{} {} completed synchronously: {}",
                operation.method,
                operation.resource_url,
                operation.status
            ),
        }

        Ok(operation)
    }

    pub(crate) fn from_initial_response(
        client: ArmClient,
        method: Method,
        resource_url: &str,
        response: HttpResponse,
    ) -> Result<Self> {
        let async_url = response.header(ASYNC_OPERATION_HEADER).map(str::to_string);
        let location = response.header(LOCATION_HEADER).map(str::to_string);

        let mut operation = Self {
            client,
            method,
            resource_url: resource_url.to_string(),
            polling: None,
            status: OperationStatus::InProgress,
            body: Value::Null,
            failure: None,
            retry_after: response.retry_after(),
            poll_count: 0,
        };

        if let Some(url) = async_url {
            operation.polling = Some(PollingMethod::AsyncOperation(url));
            operation.body = response.body;
            return Ok(operation);
        }

        if response.status == 202 {
            let Some(url) = location else {
                return Err(ArmError::InvalidResponse(format!(
                    "202 Accepted for {} without an operation URL",
                    operation.resource_url
                )));
            };
            operation.polling = Some(PollingMethod::Location(url));
            return Ok(operation);
        }

        match provisioning_state(&response.body) {
            None => operation.status = OperationStatus::Succeeded,
            Some(state) => {
                operation.status = OperationStatus::parse(state);
                if !operation.status.is_terminal() {
                    operation.polling =
                        Some(PollingMethod::ResourceBody(operation.resource_url.clone()));
                } else if !operation.status.is_success() {
                    operation.failure = extract_error_detail(&response.body);
                }
            }
        }
        operation.body = response.body;

        Ok(operation)
    }

    pub fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of status requests issued so far
    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    /// Status monitor, `None` when the request completed synchronously
    pub fn polling_method(&self) -> Option<&PollingMethod> {
        self.polling.as_ref()
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// Issue one status request and update the handle
    ///
    /// Does nothing once the operation is terminal.
    pub async fn poll(&mut self) -> Result<OperationStatus> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        let Some(polling) = self.polling.clone() else {
            return Ok(self.status);
        };

        self.poll_count += 1;

        match polling {
            PollingMethod::AsyncOperation(url) => {
                let response = self.client.request(Method::GET, &url, None).await?;
                self.retry_after = response.retry_after();
                let status = response
                    .body
                    .get("status")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ArmError::InvalidResponse(format!("Operation status missing from {}", url))
                    })?;
                self.status = OperationStatus::parse(status);
                self.body = response.body;
            }
            PollingMethod::Location(url) => {
                match self.client.request(Method::GET, &url, None).await {
                    Ok(response) => {
                        self.retry_after = response.retry_after();
                        if response.status == 202 {
                            if let Some(next) = response.header(LOCATION_HEADER) {
                                self.polling = Some(PollingMethod::Location(next.to_string()));
                            }
                            self.status = OperationStatus::InProgress;
                        } else {
                            // Some services answer with a status document instead of the result
                            self.status = response
                                .body
                                .get("status")
                                .and_then(|v| v.as_str())
                                .map(OperationStatus::parse)
                                .unwrap_or(OperationStatus::Succeeded);
                            self.body = response.body;
                        }
                    }
                    // A failed operation is reported as a client error status on the
                    // location URL; throttling and server errors are not its outcome
                    Err(ArmError::Request {
                        status,
                        code,
                        message,
                    }) if (400..500).contains(&status) && status != 429 => {
                        self.status = OperationStatus::Failed;
                        self.failure = Some((code, message));
                    }
                    Err(e) => return Err(e),
                }
            }
            PollingMethod::ResourceBody(url) => {
                match self.client.request(Method::GET, &url, None).await {
                    Ok(response) => {
                        self.retry_after = response.retry_after();
                        self.status = provisioning_state(&response.body)
                            .map(OperationStatus::parse)
                            .unwrap_or(OperationStatus::Succeeded);
                        self.body = response.body;
                    }
                    Err(e) if e.is_not_found() && self.method == Method::DELETE => {
                        self.status = OperationStatus::Succeeded;
                        self.body = Value::Null;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if matches!(self.status, OperationStatus::Failed | OperationStatus::Canceled)
            && self.failure.is_none()
        {
            self.failure = extract_error_detail(&self.body);
        }

        tracing::debug!(
            "{} {} poll #{}: {}",
            self.method,
            self.resource_url,
            self.poll_count,
            self.status
        );

        Ok(self.status)
    }

    /// Poll until terminal or until `options.timeout` elapses
    pub async fn wait(self, options: &PollerOptions) -> Result<Option<Value>> {
        self.wait_with_cancel(options, None).await
    }

    /// Poll until terminal, the deadline elapses, or `cancel` fires
    ///
    /// Returns the resulting resource (`None` for deletes). Giving up locally
    /// does not stop the remote operation.
    pub async fn wait_with_cancel(
        mut self,
        options: &PollerOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<Value>> {
        let deadline = deadline_after(options.timeout);

        while !self.status.is_terminal() {
            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(options));
            }
            let delay = self.next_delay(options).min(deadline - now);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(cancel) => return Err(self.cancelled()),
            }

            if Instant::now() >= deadline {
                return Err(self.timed_out(options));
            }

            tokio::select! {
                result = tokio::time::timeout_at(deadline, self.poll()) => match result {
                    Ok(status) => {
                        status?;
                    }
                    Err(_) => return Err(self.timed_out(options)),
                },
                _ = cancelled(cancel) => return Err(self.cancelled()),
            }
        }

        self.into_result().await
    }

    fn next_delay(&self, options: &PollerOptions) -> Duration {
        match self.retry_after {
            Some(retry_after) if options.respect_retry_after => retry_after.max(options.interval),
            _ => options.interval,
        }
    }

    fn timed_out(&self, options: &PollerOptions) -> ArmError {
        tracing::warn!(
            "{} {} still {} after {:?} ({} polls)",
            self.method,
            self.resource_url,
            self.status,
            options.timeout,
            self.poll_count
        );
        ArmError::Timeout(options.timeout)
    }

    fn cancelled(&self) -> ArmError {
        tracing::warn!("{} {} wait cancelled", self.method, self.resource_url);
        ArmError::Cancelled
    }

    /// Turn a terminal handle into the caller's result
    async fn into_result(self) -> Result<Option<Value>> {
        match self.status {
            OperationStatus::Succeeded => self.final_result().await,
            OperationStatus::Failed | OperationStatus::Canceled => {
                let (code, message) = self.failure.clone().unwrap_or_else(|| {
                    (
                        "OperationFailed".to_string(),
                        format!("{} {} did not succeed", self.method, self.resource_url),
                    )
                });
                tracing::error!(
                    "{} {} {}: {}: {}",
                    self.method,
                    self.resource_url,
                    self.status,
                    code,
                    message
                );
                Err(ArmError::OperationFailed {
                    status: self.status.to_string(),
                    code,
                    message,
                })
            }
            OperationStatus::InProgress => Err(ArmError::InvalidResponse(format!(
                "{} {} has not finished",
                self.method, self.resource_url
            ))),
        }
    }

    async fn final_result(self) -> Result<Option<Value>> {
        if self.method == Method::DELETE {
            return Ok(None);
        }

        match self.polling {
            Some(PollingMethod::AsyncOperation(_)) => {
                if self.body.get("properties").is_some() {
                    return Ok(Some(self.body));
                }
                if self.method == Method::PUT || self.method == Method::PATCH {
                    let body = self.client.get(&self.resource_url).await?;
                    return Ok(non_null(body));
                }
                Ok(None)
            }
            _ => Ok(non_null(self.body)),
        }
    }
}

/// `properties.provisioningState` of a resource body
pub fn provisioning_state(body: &Value) -> Option<&str> {
    body.get("properties")?
        .get("provisioningState")?
        .as_str()
}

/// Deadline `timeout` from now, saturating far in the future for huge timeouts
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => futures::future::pending::<()>().await,
    }
}
