//! Maps a failed attempt onto the [`ApiError`] taxonomy.
//!
//! A [`Failure`] is what one attempt produced: either no response at all
//! ([`TransportFailure`]) or a non-success response ([`HttpFailure`]).
//! [`classify`] is a pure function of that outcome.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use reqwest::header::RETRY_AFTER;
use serde_json::Value;

use crate::error::{ApiError, ConnectionErrorKind, ServerErrorKind};

/// Seconds to wait when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Low-level cause of a request that got no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    ConnectionRefused,
    ConnectionReset,
    TimedOut,
    HostUnreachable,
    Aborted,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub code: TransportCode,
    pub message: String,
}

impl TransportFailure {
    pub fn new(code: TransportCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Derives the transport code from reqwest's flags and the I/O error
    /// buried in its source chain.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let code = if error.is_timeout() {
            TransportCode::TimedOut
        } else {
            io_error_kind(error)
                .map(code_for_io_kind)
                .unwrap_or(TransportCode::Other)
        };
        Self::new(code, error_chain_message(error))
    }
}

/// Non-success HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: Value,
}

impl HttpFailure {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            retry_after: None,
            body,
        }
    }

    pub fn with_retry_after(mut self, retry_after: impl Into<String>) -> Self {
        self.retry_after = Some(retry_after.into());
        self
    }

    /// Consumes a response, keeping its status, `Retry-After` header and body.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, TransportFailure> {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e))?;

        Ok(Self {
            status,
            retry_after,
            body: decode_body(&text),
        })
    }

    /// `message` field of the body, if any.
    fn body_message(&self) -> Option<String> {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    fn response(&self) -> Option<Value> {
        match &self.body {
            Value::Null => None,
            body => Some(body.clone()),
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Transport(TransportFailure),
    Http(HttpFailure),
}

impl From<TransportFailure> for Failure {
    fn from(failure: TransportFailure) -> Self {
        Failure::Transport(failure)
    }
}

impl From<HttpFailure> for Failure {
    fn from(failure: HttpFailure) -> Self {
        Failure::Http(failure)
    }
}

impl From<reqwest::Error> for Failure {
    fn from(error: reqwest::Error) -> Self {
        Failure::Transport(TransportFailure::from_reqwest(&error))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transport(t) => write!(f, "{:?}: {}", t.code, t.message),
            Failure::Http(h) => write!(f, "HTTP {}", h.status),
        }
    }
}

pub fn classify(failure: &Failure) -> ApiError {
    match failure {
        Failure::Transport(t) => match t.code {
            TransportCode::TimedOut | TransportCode::Aborted => ApiError::timeout(&t.message),
            _ => ApiError::connection_failed(&t.message),
        },
        Failure::Http(h) => classify_status(h),
    }
}

fn classify_status(failure: &HttpFailure) -> ApiError {
    let status = failure.status;
    let message = |default: &str| failure.body_message().unwrap_or_else(|| default.to_string());
    let response = failure.response();

    match status {
        401 => ApiError::Authentication {
            message: message("Unauthorized"),
            status,
            response,
        },
        422 => ApiError::Validation {
            message: message("Validation failed"),
            status,
            errors: field_errors(&failure.body),
            response,
        },
        429 => ApiError::RateLimit {
            message: message("Rate limit exceeded"),
            retry_after: parse_retry_after(failure.retry_after.as_deref()),
            response,
        },
        404 => ApiError::NotFound {
            message: message("Resource not found"),
            status,
            response,
        },
        503 => ApiError::Server {
            kind: ServerErrorKind::Maintenance,
            message: message("Service unavailable"),
            status,
            response,
        },
        s if s >= 500 => ApiError::Server {
            kind: ServerErrorKind::Internal,
            message: message("Server error"),
            status,
            response,
        },
        _ => ApiError::Api {
            message: message(&format!("Request failed with status code {}", status)),
            status,
            response,
        },
    }
}

/// Parses `Retry-After` as whole seconds, falling back to
/// [`DEFAULT_RETRY_AFTER_SECS`] when absent or not numeric.
pub fn parse_retry_after(header: Option<&str>) -> u64 {
    let Some(value) = header.map(str::trim) else {
        return DEFAULT_RETRY_AFTER_SECS;
    };
    if let Ok(secs) = value.parse::<u64>() {
        return secs;
    }
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => secs.floor() as u64,
        _ => DEFAULT_RETRY_AFTER_SECS,
    }
}

/// Empty bodies decode to `null`, non-JSON bodies to a JSON string.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Flattens the body's `errors` object into field -> message. Array values
/// (one entry per failed rule) are joined with a space.
fn field_errors(body: &Value) -> BTreeMap<String, String> {
    let Some(errors) = body.get("errors").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    errors
        .iter()
        .map(|(field, value)| {
            let message = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            (field.clone(), message)
        })
        .collect()
}

fn io_error_kind(error: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = Some(error);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = err.source();
    }
    None
}

fn code_for_io_kind(kind: io::ErrorKind) -> TransportCode {
    match kind {
        io::ErrorKind::ConnectionRefused => TransportCode::ConnectionRefused,
        io::ErrorKind::ConnectionReset => TransportCode::ConnectionReset,
        io::ErrorKind::TimedOut => TransportCode::TimedOut,
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
            TransportCode::HostUnreachable
        }
        io::ErrorKind::ConnectionAborted => TransportCode::Aborted,
        _ => TransportCode::Other,
    }
}

/// reqwest's top-level message is terse; include the causes.
fn error_chain_message(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        let cause = err.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
        source = err.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16, body: Value) -> Failure {
        Failure::Http(HttpFailure::new(status, body))
    }

    #[test]
    fn test_timeout_and_abort_map_to_timeout() {
        for code in [TransportCode::TimedOut, TransportCode::Aborted] {
            let err = classify(&Failure::Transport(TransportFailure::new(code, "timeout")));
            assert!(matches!(
                err,
                ApiError::Connection {
                    kind: ConnectionErrorKind::Timeout,
                    ..
                }
            ));
            assert_eq!(err.status_code(), 0);
        }
    }

    #[test]
    fn test_other_transport_failures_map_to_connection_failed() {
        for code in [
            TransportCode::ConnectionRefused,
            TransportCode::ConnectionReset,
            TransportCode::HostUnreachable,
            TransportCode::Other,
        ] {
            let err = classify(&Failure::Transport(TransportFailure::new(code, "boom")));
            assert!(matches!(
                err,
                ApiError::Connection {
                    kind: ConnectionErrorKind::Failed,
                    ..
                }
            ));
            assert_eq!(err.message(), "boom");
        }
    }

    #[test]
    fn test_unauthorized() {
        let err = classify(&http(401, json!({"message": "Token revoked"})));
        assert!(matches!(err, ApiError::Authentication { status: 401, .. }));
        assert_eq!(err.message(), "Token revoked");

        let err = classify(&http(401, Value::Null));
        assert_eq!(err.message(), "Unauthorized");
        assert!(err.response().is_none());
    }

    #[test]
    fn test_validation_errors() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": {
                "plan_id": ["The plan id field is required.", "The plan id must be an integer."],
                "quantity": "The quantity must be at least 1."
            }
        });
        let err = classify(&http(422, body.clone()));

        let errors = err.validation_errors().unwrap();
        assert_eq!(
            errors["plan_id"],
            "The plan id field is required. The plan id must be an integer."
        );
        assert_eq!(errors["quantity"], "The quantity must be at least 1.");
        assert_eq!(err.message(), "The given data was invalid.");
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.response(), Some(&body));
    }

    #[test]
    fn test_validation_without_errors_field() {
        let err = classify(&http(422, json!({})));
        assert_eq!(err.message(), "Validation failed");
        assert!(err.validation_errors().unwrap().is_empty());
    }

    #[test]
    fn test_rate_limit_retry_after() {
        let failure = Failure::Http(HttpFailure::new(429, json!({})).with_retry_after("2"));
        let err = classify(&failure);
        assert_eq!(err.retry_after(), Some(2));
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.message(), "Rate limit exceeded");

        let err = classify(&http(429, Value::Null));
        assert_eq!(err.retry_after(), Some(60));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("2")), 2);
        assert_eq!(parse_retry_after(Some(" 15 ")), 15);
        assert_eq!(parse_retry_after(Some("2.7")), 2);
        assert_eq!(parse_retry_after(None), 60);
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), 60);
        assert_eq!(parse_retry_after(Some("-3")), 60);
    }

    #[test]
    fn test_not_found() {
        let err = classify(&http(404, Value::Null));
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Resource not found");
    }

    #[test]
    fn test_server_errors() {
        let err = classify(&http(503, Value::Null));
        assert!(matches!(
            err,
            ApiError::Server {
                kind: ServerErrorKind::Maintenance,
                status: 503,
                ..
            }
        ));
        assert_eq!(err.message(), "Service unavailable");

        let err = classify(&http(502, json!({"message": "Bad gateway"})));
        assert!(matches!(
            err,
            ApiError::Server {
                kind: ServerErrorKind::Internal,
                status: 502,
                ..
            }
        ));
        assert_eq!(err.message(), "Bad gateway");
    }

    #[test]
    fn test_generic_fallback_keeps_raw_body() {
        let body = json!({"detail": "conflict"});
        let err = classify(&http(409, body.clone()));
        assert!(matches!(err, ApiError::Api { status: 409, .. }));
        assert_eq!(err.message(), "Request failed with status code 409");
        assert_eq!(err.response(), Some(&body));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("  \n"), Value::Null);
        assert_eq!(decode_body(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(
            decode_body("<html>Bad Gateway</html>"),
            Value::String("<html>Bad Gateway</html>".to_string())
        );
    }

    #[test]
    fn test_io_error_kind_walks_source_chain() {
        #[derive(Debug)]
        struct Wrapper(io::Error);
        impl fmt::Display for Wrapper {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "request failed")
            }
        }
        impl StdError for Wrapper {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let err = Wrapper(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        assert_eq!(io_error_kind(&err), Some(io::ErrorKind::ConnectionReset));
        assert_eq!(error_chain_message(&err), "request failed: reset by peer");
        assert_eq!(
            code_for_io_kind(io::ErrorKind::ConnectionRefused),
            TransportCode::ConnectionRefused
        );
        assert_eq!(code_for_io_kind(io::ErrorKind::NotFound), TransportCode::Other);
    }

    #[tokio::test]
    async fn test_http_failure_from_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(429)
            .with_header("Retry-After", "7")
            .with_body(r#"{"message": "Too many"}"#)
            .create_async()
            .await;

        let response = reqwest::Client::new().get(server.url()).send().await.unwrap();
        let failure = HttpFailure::from_response(response).await.unwrap();

        assert_eq!(failure.status, 429);
        assert_eq!(failure.retry_after.as_deref(), Some("7"));
        assert_eq!(failure.body, json!({"message": "Too many"}));
    }
}
