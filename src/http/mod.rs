//! HTTP request executor with retry logic and error classification.

mod classify;
mod client;
mod retry;

pub use classify::{
    DEFAULT_RETRY_AFTER_SECS, Failure, HttpFailure, TransportCode, TransportFailure, classify,
    decode_body, parse_retry_after,
};
pub(crate) use client::build_client;
pub use client::{HttpClient, Query, RequestOptions};
pub use reqwest::Method;
pub use retry::{MAX_RETRY_AFTER, RetryDecision, RetryPolicy, is_retryable_transport};
