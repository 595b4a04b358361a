//! Error types for API client operations.

use serde_json::{Map, Value};
use thiserror::Error;

/// Machine code for local validation failures.
pub const CODE_VALIDATION: &str = "VALIDATION_ERROR";
/// Machine code for transport failures (no HTTP status).
pub const CODE_NETWORK: &str = "NETWORK_ERROR";
/// Machine code for requests that exceeded their deadline.
pub const CODE_TIMEOUT: &str = "TIMEOUT_ERROR";
/// Machine code for requests superseded or aborted on the client side.
pub const CODE_CANCELLED: &str = "REQUEST_CANCELLED";
/// Machine code for success responses that could not be decoded.
pub const CODE_INVALID_RESPONSE: &str = "INVALID_RESPONSE";
/// Machine code for non-2xx responses without a server-supplied code.
pub const CODE_HTTP: &str = "HTTP_ERROR";
/// Machine code used for 429 responses without a server-supplied code.
pub const CODE_RATE_LIMITED: &str = "RATE_LIMIT_EXCEEDED";

/// Errors produced by [`ApiClient`](super::ApiClient) operations.
///
/// Every variant exposes the same uniform shape through [`ApiError::message`],
/// [`ApiError::status`], [`ApiError::code`] and [`ApiError::details`], so callers
/// can treat failures uniformly regardless of the transport failure mode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Input rejected locally before any network call was made.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<&'static str>,
    },

    /// Transport-level failure (DNS, connection refused, offline).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline and was aborted.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Request was superseded by a newer one on the same client, or cancelled explicitly.
    #[error("Request was cancelled")]
    Cancelled,

    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
        details: Map<String, Value>,
    },

    /// Success response declared JSON but could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field: Some(field),
        }
    }

    /// Human-readable message, without the classification prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Network(message) => message.clone(),
            ApiError::Timeout(ms) => format!("Request timed out after {}ms", ms),
            ApiError::Cancelled => "Request was cancelled".to_string(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::InvalidResponse(message) => message.clone(),
        }
    }

    /// HTTP status code, present only for [`ApiError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable classification code.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Validation { .. } => Some(CODE_VALIDATION),
            ApiError::Network(_) => Some(CODE_NETWORK),
            ApiError::Timeout(_) => Some(CODE_TIMEOUT),
            ApiError::Cancelled => Some(CODE_CANCELLED),
            ApiError::InvalidResponse(_) => Some(CODE_INVALID_RESPONSE),
            ApiError::Http { code: Some(code), .. } => Some(code.as_str()),
            ApiError::Http { status: 429, .. } => Some(CODE_RATE_LIMITED),
            ApiError::Http { .. } => Some(CODE_HTTP),
        }
    }

    /// Structured detail mapping supplied by the server, if any.
    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            ApiError::Http { details, .. } if !details.is_empty() => Some(details),
            _ => None,
        }
    }

    /// True for failures that never reached the server as a complete exchange.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// Whether offering the user a retry makes sense.
    ///
    /// Errors without a status (network, timeout), 5xx and 429 are retryable.
    /// Other statuses, local validation failures and client-side cancellation are not.
    /// The client never acts on this itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            ApiError::Validation { .. } | ApiError::Cancelled | ApiError::InvalidResponse(_) => {
                false
            }
        }
    }
}

/// Build an [`ApiError::Http`] from a status and an optional response body.
///
/// The message is taken from `error.message`, a string `error`, `message`, or a
/// string `detail`, in that order. Details come from `error.details` or `details`.
/// Without a usable body the message falls back to `"HTTP <status>: <reason>"`.
pub(crate) fn http_error(status: u16, reason: Option<&str>, body: Option<&Value>) -> ApiError {
    let fallback = format!("HTTP {}: {}", status, reason.unwrap_or("Unknown Status"));

    let Some(Value::Object(obj)) = body else {
        return ApiError::Http {
            status,
            message: fallback,
            code: None,
            details: Map::new(),
        };
    };

    let nested = obj.get("error").and_then(Value::as_object);

    let message = nested
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| obj.get("error").and_then(Value::as_str))
        .or_else(|| obj.get("message").and_then(Value::as_str))
        .or_else(|| obj.get("detail").and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback);

    let code = nested
        .and_then(|e| e.get("code"))
        .or_else(|| obj.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let details = nested
        .and_then(|e| e.get("details"))
        .or_else(|| obj.get("details"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    ApiError::Http {
        status,
        message,
        code,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_error_string_error_field() {
        let err = http_error(500, Some("Internal Server Error"), Some(&json!({"error": "boom"})));
        assert_eq!(err.message(), "boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_http_error_nested_error_object() {
        let body = json!({
            "error": {"message": "bad input", "code": "E_INPUT", "details": {"field": "query"}}
        });
        let err = http_error(400, Some("Bad Request"), Some(&body));

        assert_eq!(err.message(), "bad input");
        assert_eq!(err.code(), Some("E_INPUT"));
        assert_eq!(err.details().unwrap()["field"], "query");
    }

    #[test]
    fn test_http_error_fastapi_detail() {
        let err = http_error(403, Some("Forbidden"), Some(&json!({"detail": "Not authorized"})));
        assert_eq!(err.message(), "Not authorized");
        assert_eq!(err.code(), Some(CODE_HTTP));
    }

    #[test]
    fn test_http_error_fallback_without_body() {
        let err = http_error(502, Some("Bad Gateway"), None);
        assert_eq!(err.message(), "HTTP 502: Bad Gateway");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_http_error_fallback_when_detail_not_string() {
        let body = json!({"detail": [{"loc": ["body", "query"], "msg": "field required"}]});
        let err = http_error(422, Some("Unprocessable Entity"), Some(&body));
        assert_eq!(err.message(), "HTTP 422: Unprocessable Entity");
    }

    #[test]
    fn test_rate_limit_code() {
        let err = http_error(429, Some("Too Many Requests"), None);
        assert_eq!(err.code(), Some(CODE_RATE_LIMITED));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("connection refused".into()).is_retryable());
        assert!(ApiError::Timeout(30_000).is_retryable());
        assert!(http_error(500, None, None).is_retryable());
        assert!(http_error(503, None, None).is_retryable());
        assert!(http_error(429, None, None).is_retryable());

        assert!(!http_error(400, None, None).is_retryable());
        assert!(!http_error(401, None, None).is_retryable());
        assert!(!http_error(404, None, None).is_retryable());
        assert!(!ApiError::validation("query", "empty").is_retryable());
        assert!(!ApiError::Cancelled.is_retryable());
    }

    #[test]
    fn test_timeout_distinct_from_network() {
        let timeout = ApiError::Timeout(100);
        let network = ApiError::Network("dns".into());

        assert_eq!(timeout.code(), Some(CODE_TIMEOUT));
        assert_eq!(network.code(), Some(CODE_NETWORK));
        assert!(timeout.is_timeout());
        assert!(!network.is_timeout());
        assert_eq!(timeout.status(), None);
        assert_eq!(network.status(), None);
    }

    #[test]
    fn test_message_has_no_prefix() {
        let err = ApiError::validation("query", "Message cannot be empty");
        assert_eq!(err.message(), "Message cannot be empty");
        assert_eq!(err.to_string(), "Validation error: Message cannot be empty");
    }
}
