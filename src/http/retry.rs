//! Retry policy for API requests.
//!
//! Only transient conditions are retried: rate limiting, server errors and a
//! fixed set of network failures. Everything else fails on the first attempt.

use std::time::Duration;

use super::classify::{Failure, TransportCode, TransportFailure, parse_retry_after};
use crate::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY};

/// Longest wait honoured for a `Retry-After` header.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again.
    Retry(Duration),
    /// Give up and surface the classified error.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries(), config.retry_base_delay())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u64 {
        u64::from(self.max_retries) + 1
    }

    /// Linear backoff: `base_delay * (attempt + 1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Decides whether the zero-based `attempt` that produced `failure` is
    /// followed by another one.
    pub fn decide(&self, failure: &Failure, attempt: u32) -> RetryDecision {
        let attempts_remain = attempt < self.max_retries;

        match failure {
            Failure::Transport(transport) => {
                if attempts_remain && is_retryable_transport(transport) {
                    RetryDecision::Retry(self.backoff(attempt))
                } else {
                    RetryDecision::Fail
                }
            }
            Failure::Http(http) => match http.status {
                // Stale token or deterministic validation failure
                401 | 422 => RetryDecision::Fail,
                429 if attempts_remain => RetryDecision::Retry(
                    Duration::from_secs(parse_retry_after(http.retry_after.as_deref()))
                        .min(MAX_RETRY_AFTER),
                ),
                400..=499 => RetryDecision::Fail,
                s if s >= 500 && attempts_remain => RetryDecision::Retry(self.backoff(attempt)),
                _ => RetryDecision::Fail,
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY)
    }
}

/// Network failures worth another attempt.
pub fn is_retryable_transport(failure: &TransportFailure) -> bool {
    matches!(
        failure.code,
        TransportCode::ConnectionRefused
            | TransportCode::ConnectionReset
            | TransportCode::TimedOut
            | TransportCode::HostUnreachable
    ) || failure.message.contains("timeout")
}
