//! HTTP utilities for ARM REST API calls

use crate::error::{ArmError, ErrorKind, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the caller-generated request correlation ID
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    let truncated = if total > MAX_LOG_BODY_LENGTH {
        format!("{}... [truncated, {} bytes total]", truncated, body.len())
    } else {
        truncated
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A response that has already passed the success check
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Value::Null` when empty
    pub body: Value,
}

impl HttpResponse {
    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Retry-After` in seconds, if present and numeric
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self { client })
    }

    /// Send a request and return the parsed response
    ///
    /// Non-2xx responses are turned into [`ArmError`] using the ARM error
    /// envelope.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!("{} {} [{}]", method, url, request_id);

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, &request_id);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => {
                    return Err(ArmError::InvalidResponse(format!(
                        "Failed to parse response JSON: {}",
                        e
                    )));
                }
                // Error pages are not always JSON; the status alone is enough
                Err(_) => Value::Null,
            }
        };

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} {} -> {} - {}",
                method,
                url,
                status,
                sanitize_for_log(&text)
            );
            return Err(ArmError::from_response(status.as_u16(), &body));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Format an ARM error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_arm_error(error: &ArmError) -> String {
    if error.is_not_found() {
        return "Resource not found.".to_string();
    }
    if error.is_conflict() {
        return "Resource conflict. Another operation may be in progress on this resource."
            .to_string();
    }

    match error.kind() {
        ErrorKind::Authentication => {
            "Authentication failed. Refresh AZURE_ACCESS_TOKEN with 'az account get-access-token'."
                .to_string()
        }
        ErrorKind::Timeout => {
            "Timed out waiting for the operation. It may still complete remotely.".to_string()
        }
        ErrorKind::Cancelled => {
            "Wait cancelled. The operation may still complete remotely.".to_string()
        }
        _ => {
            let error_str = error.to_string();
            let sanitized = error_str
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(160)
                .collect::<String>();

            if sanitized.len() < error_str.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}
