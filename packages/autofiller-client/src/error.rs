//! Typed errors for the Autofiller client.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the kind of failure instead of parsing messages. Every error carries a
//! machine-readable code and a human message.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type for Autofiller client operations.
pub type Result<T> = std::result::Result<T, AutofillerError>;

/// Errors returned by the Autofiller client.
#[derive(Debug, Clone, Error)]
pub enum AutofillerError {
    /// Malformed caller input, or a 400/422 response
    #[error("[validation_error] {message}")]
    Validation { message: String },

    /// Missing or rejected API key (401)
    #[error("[authentication_error] {message}")]
    Authentication { message: String },

    /// Too many requests (429)
    #[error("[rate_limit_exceeded] {message}")]
    RateLimit { message: String },

    /// Document processing failed server-side
    #[error("[{code}] {message}")]
    Extraction { code: String, message: String },

    /// Any other API or network failure
    #[error("[{code}] {message}")]
    Api {
        status: Option<u16>,
        code: String,
        message: String,
    },

    /// Request or overall-wait deadline exceeded
    #[error("[timeout] {message}")]
    Timeout { message: String },

    /// Success response that could not be understood
    #[error("[protocol_error] {message}")]
    Protocol { message: String },

    /// Caller cancelled the operation
    #[error("[cancelled] {message}")]
    Cancelled { message: String },
}

/// Tag for the kind of an [`AutofillerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    RateLimit,
    Extraction,
    Api,
    Timeout,
    Protocol,
    Cancelled,
}

impl AutofillerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Generic error without an HTTP status.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Network failure (DNS, connection refused, reset).
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::api("request_failed", message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::Api { .. } => ErrorKind::Api,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Authentication { .. } => "authentication_error",
            Self::RateLimit { .. } => "rate_limit_exceeded",
            Self::Extraction { code, .. } | Self::Api { code, .. } => code,
            Self::Timeout { .. } => "timeout",
            Self::Protocol { .. } => "protocol_error",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Authentication { message }
            | Self::RateLimit { message }
            | Self::Extraction { message, .. }
            | Self::Api { message, .. }
            | Self::Timeout { message }
            | Self::Protocol { message }
            | Self::Cancelled { message } => message,
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether an idempotent request that failed this way may be re-sent.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimit { .. } => true,
            Self::Api { status, code, .. } => {
                code == "request_failed" || status.is_some_and(|s| s >= 500)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AutofillerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::validation(format!("Invalid request: {}", err))
        } else if err.is_timeout() {
            Self::timeout(format!("Request timed out: {}", err))
        } else {
            Self::request_failed(format!("Request failed: {}", err))
        }
    }
}

/// Error body returned by the API. Both fields are optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Map a non-success response to an error.
///
/// Pure function of the status and the raw body. Bodies that are not JSON fall
/// back to the status reason phrase and an `http_<status>` code.
pub fn classify(status: StatusCode, body: &str) -> AutofillerError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed.message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });

    match status.as_u16() {
        401 => AutofillerError::Authentication { message },
        429 => AutofillerError::RateLimit { message },
        400 | 422 => AutofillerError::Validation { message },
        other => AutofillerError::Api {
            status: Some(other),
            code: parsed.code.unwrap_or_else(|| format!("http_{}", other)),
            message,
        },
    }
}
