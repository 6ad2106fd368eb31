//! Error types for ARM network operations
//!
//! Every failure is surfaced as an [`ArmError`]. Callers that only need the
//! coarse category (authentication, validation, remote failure, timeout) can
//! use [`ArmError::kind`].

use std::time::Duration;
use thiserror::Error;

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential acquisition failed or the token was rejected (401/403)
    Authentication,
    /// The control plane rejected the request before accepting it
    Validation,
    /// The operation was accepted but reported a failed or canceled state
    RemoteOperationFailed,
    /// The local wait deadline elapsed
    Timeout,
    /// The local wait was cancelled by the caller
    Cancelled,
    /// Network failure or an unreadable response
    Transport,
    /// Missing or invalid local configuration
    Configuration,
}

/// Error returned by every client operation
#[derive(Error, Debug)]
pub enum ArmError {
    /// Credential failure or 401/403 from the control plane
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-success response to a request
    #[error("Request failed ({status}): {code}: {message}")]
    Request {
        status: u16,
        code: String,
        message: String,
    },

    /// Long-running operation reached a failed or canceled terminal state
    #[error("Operation {status}: {code}: {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    /// Operation did not reach a terminal state before the deadline
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Caller cancelled the wait
    #[error("Operation wait was cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid resource ID '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, ArmError>;

impl ArmError {
    /// Build an error from a non-success HTTP status and the ARM error envelope
    ///
    /// ARM errors look like `{"error": {"code": "...", "message": "..."}}`;
    /// when the body does not follow that shape the status text is used.
    pub fn from_response(status: u16, body: &serde_json::Value) -> Self {
        let (code, message) = extract_error_detail(body)
            .unwrap_or_else(|| (status_code_name(status).to_string(), String::new()));

        if status == 401 || status == 403 {
            let detail = if message.is_empty() { code } else { format!("{}: {}", code, message) };
            return ArmError::Authentication(detail);
        }

        ArmError::Request {
            status,
            code,
            message,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArmError::Authentication(_) => ErrorKind::Authentication,
            ArmError::Request { status, .. } if *status >= 500 || *status == 429 => {
                ErrorKind::Transport
            }
            ArmError::Request { .. } => ErrorKind::Validation,
            ArmError::OperationFailed { .. } => ErrorKind::RemoteOperationFailed,
            ArmError::Timeout(_) => ErrorKind::Timeout,
            ArmError::Cancelled => ErrorKind::Cancelled,
            ArmError::Transport(_) | ArmError::InvalidResponse(_) => ErrorKind::Transport,
            ArmError::InvalidRequest(_) | ArmError::InvalidResourceId { .. } => {
                ErrorKind::Validation
            }
            ArmError::UnknownResourceType(_) | ArmError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if the resource does not exist (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::Request { status: 404, .. })
    }

    /// Returns true for 409 responses, typically another operation in progress
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ArmError::Request { status: 409, .. })
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ArmError::Timeout(_))
    }

    /// Returns true if retrying the same call could succeed
    ///
    /// Nothing in this crate retries; this is for callers that want to.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ArmError::Request { status, .. } => *status == 409 || *status == 429 || *status >= 500,
            ArmError::Transport(_) | ArmError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// Pull `code` and `message` out of an ARM error envelope
pub(crate) fn extract_error_detail(body: &serde_json::Value) -> Option<(String, String)> {
    let error = body.get("error")?;
    let code = error
        .get("code")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let message = error
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}

fn status_code_name(status: u16) -> &'static str {
    match status {
        400 => "BadRequest",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        409 => "Conflict",
        412 => "PreconditionFailed",
        429 => "TooManyRequests",
        500 => "InternalServerError",
        503 => "ServiceUnavailable",
        _ => "HttpError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response_reads_arm_envelope() {
        let body = json!({
            "error": {
                "code": "InvalidAddressPrefix",
                "message": "Address prefix 10.0.0.0/33 is not valid"
            }
        });
        let err = ArmError::from_response(400, &body);

        match &err {
            ArmError::Request { status, code, message } => {
                assert_eq!(*status, 400);
                assert_eq!(code, "InvalidAddressPrefix");
                assert!(message.contains("10.0.0.0/33"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_response_without_envelope() {
        let err = ArmError::from_response(404, &serde_json::Value::Null);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("NotFound"));
    }

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let body = json!({"error": {"code": "InvalidAuthenticationToken", "message": "expired"}});
        let err = ArmError::from_response(401, &body);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.to_string().contains("InvalidAuthenticationToken"));

        let err = ArmError::from_response(403, &serde_json::Value::Null);
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_conflict_is_retryable() {
        let body = json!({"error": {"code": "AnotherOperationInProgress", "message": "busy"}});
        let err = ArmError::from_response(409, &body);
        assert!(err.is_conflict());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_kind() {
        let err = ArmError::Timeout(Duration::from_secs(30));
        assert!(err.is_timeout());
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_operation_failed_kind() {
        let err = ArmError::OperationFailed {
            status: "Failed".to_string(),
            code: "GatewaySubnetMissing".to_string(),
            message: "no GatewaySubnet".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
        assert!(!err.is_retryable());
    }
}
