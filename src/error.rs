//! Error taxonomy for API calls.
//!
//! Every failed call surfaces exactly one [`ApiError`]. Each variant carries the
//! human-readable message, the HTTP status (0 when no response was received) and
//! the raw response payload when one was available.

use std::collections::BTreeMap;

use serde_json::Value;

/// Result alias used throughout the SDK.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Sub-case of [`ApiError::Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    /// HTTP 503, the API is under maintenance.
    Maintenance,
    /// Any other 5xx status.
    Internal,
}

/// Sub-case of [`ApiError::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The request was aborted or timed out before a response arrived.
    Timeout,
    /// The connection could not be established or was dropped.
    Failed,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// HTTP 401.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status: u16,
        response: Option<Value>,
    },

    /// HTTP 422 with per-field messages.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        status: u16,
        errors: BTreeMap<String, String>,
        response: Option<Value>,
    },

    /// HTTP 429.
    #[error("Rate limit exceeded: {message} (retry after {retry_after}s)")]
    RateLimit {
        message: String,
        retry_after: u64,
        response: Option<Value>,
    },

    /// HTTP 404.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        status: u16,
        response: Option<Value>,
    },

    /// HTTP 5xx.
    #[error("Server error ({status}): {message}")]
    Server {
        kind: ServerErrorKind,
        message: String,
        status: u16,
        response: Option<Value>,
    },

    /// No response was received.
    #[error("Connection error: {message}")]
    Connection {
        kind: ConnectionErrorKind,
        message: String,
    },

    /// Any other HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        message: String,
        status: u16,
        response: Option<Value>,
    },

    /// The SDK was configured with unusable values.
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl ApiError {
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::authentication(message)
    }

    pub fn token_expired() -> Self {
        Self::authentication("Token has expired")
    }

    pub fn unauthorized() -> Self {
        Self::authentication("Unauthorized")
    }

    fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            status: 401,
            response: None,
        }
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Server {
            kind: ServerErrorKind::Maintenance,
            message: message.into(),
            status: 503,
            response: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Connection {
            kind: ConnectionErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::Connection {
            kind: ConnectionErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            status: 404,
            response: None,
        }
    }

    pub fn plan_not_found(id: impl std::fmt::Display) -> Self {
        Self::not_found(format!("Plan with ID {} not found", id))
    }

    pub fn order_not_found(id: impl std::fmt::Display) -> Self {
        Self::not_found(format!("Order with ID {} not found", id))
    }

    pub fn esim_not_found(iccid: &str) -> Self {
        Self::not_found(format!("eSIM with ICCID {} not found", iccid))
    }

    /// The human-readable message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::Validation { message, .. }
            | Self::RateLimit { message, .. }
            | Self::NotFound { message, .. }
            | Self::Server { message, .. }
            | Self::Connection { message, .. }
            | Self::Api { message, .. }
            | Self::Configuration { message } => message,
        }
    }

    /// HTTP status, or 0 when no response was received.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Authentication { status, .. }
            | Self::Validation { status, .. }
            | Self::NotFound { status, .. }
            | Self::Server { status, .. }
            | Self::Api { status, .. } => *status,
            Self::RateLimit { .. } => 429,
            Self::Connection { .. } | Self::Configuration { .. } => 0,
        }
    }

    /// Raw decoded response body, if the server sent one.
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Authentication { response, .. }
            | Self::Validation { response, .. }
            | Self::RateLimit { response, .. }
            | Self::NotFound { response, .. }
            | Self::Server { response, .. }
            | Self::Api { response, .. } => response.as_ref(),
            Self::Connection { .. } | Self::Configuration { .. } => None,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
