//! Error types for API client operations

use crate::session::SessionStoreError;
use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors returned by [`ApiClient`](crate::ApiClient) and the typed services
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the backend
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
        /// Raw response body
        body: String,
    },

    /// The session could not be renewed and has been cleared
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// The background refresh task ended without an outcome
    #[error("Session refresh interrupted: {0}")]
    RefreshInterrupted(String),

    /// A 2xx body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Session persistence failed
    #[error("Session storage error: {0}")]
    Storage(#[from] SessionStoreError),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for API client operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Build a status error from a response body.
    ///
    /// The message comes from the backend's `message` or `error` field when
    /// the body is a JSON object, otherwise from the (truncated) body itself.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = Self::extract_message(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                Self::truncate_body(&body)
            }
        });

        ApiError::Status { status, message, body }
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body, for status errors
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials (HTTP 401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }

    /// Whether the session has ended and the user must log in again
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    fn extract_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;
        ["message", "error"]
            .iter()
            .find_map(|key| object.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    fn truncate_body(body: &str) -> String {
        match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
            Some((cut, _)) => format!("{}... (truncated, {} total bytes)", &body[..cut], body.len()),
            None => body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_json_body() {
        let err = ApiError::from_status(400, r#"{"message":"Email already registered"}"#);
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Email already registered"));
    }

    #[test]
    fn test_error_field_used_when_no_message() {
        let err = ApiError::from_status(403, r#"{"error":"Forbidden"}"#);
        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "Forbidden"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = ApiError::from_status(503, "");
        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "Service Unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH * 2);
        let err = ApiError::from_status(500, body.clone());
        match err {
            ApiError::Status { message, body: raw, .. } => {
                assert!(message.contains("truncated"));
                assert!(message.len() < body.len());
                assert_eq!(raw, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classification() {
        assert!(ApiError::from_status(401, "").is_unauthorized());
        assert!(!ApiError::from_status(403, "").is_unauthorized());
        assert!(ApiError::SessionExpired.is_session_expired());
        assert_eq!(ApiError::SessionExpired.status(), None);
    }
}
