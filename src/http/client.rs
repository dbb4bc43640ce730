//! Authenticated HTTP client with built-in retry logic and error handling.

use std::sync::Arc;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;

use super::classify::{Failure, HttpFailure, classify, decode_body};
use super::retry::{RetryDecision, RetryPolicy};
use crate::auth::TokenProvider;
use crate::config::Config;
use crate::error::{ApiError, Result};

/// Query string pairs, sent in order.
pub type Query = Vec<(String, String)>;

/// Optional parts of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub query: Query,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query.extend(query);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Executes API calls with a bearer token, retrying transient failures.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<Config>,
    tokens: Arc<dyn TokenProvider>,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: Arc<Config>, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = build_client(&config, headers)?;
        let policy = RetryPolicy::from_config(&config);

        Ok(Self {
            client,
            config,
            tokens,
            policy,
        })
    }

    /// Overrides the retry limit from the configuration.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.policy = RetryPolicy::new(max_retries, self.config.retry_base_delay());
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token_provider(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    pub async fn get(&self, path: &str, query: Query) -> Result<Value> {
        self.execute(Method::GET, path, RequestOptions::new().with_query(query))
            .await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::POST, path, RequestOptions::new().body(body))
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::PUT, path, RequestOptions::new().body(body))
            .await
    }

    pub async fn delete(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::DELETE, path, RequestOptions::new().body(body))
            .await
    }

    /// Sends `method path` and returns the decoded JSON body.
    ///
    /// Makes up to `max_retries + 1` attempts. A token is fetched before each
    /// attempt; if that fails the whole call fails without retrying.
    #[tracing::instrument(skip(self, options))]
    pub async fn execute(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value> {
        let url = self.config.endpoint_url(path);
        let max_attempts = self.policy.max_attempts();
        let mut last_failure = None;

        for attempt in 0..=self.policy.max_retries() {
            let token = self.tokens.get_token().await?;

            let failure = match self.send_once(&method, &url, &token, &options).await {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            match self.policy.decide(&failure, attempt) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        "{} {}: attempt {}/{} failed ({}), retrying in {}ms...",
                        method,
                        path,
                        attempt + 1,
                        max_attempts,
                        failure,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    last_failure = Some(failure);
                }
                RetryDecision::Fail => {
                    debug!("{} {}: giving up after {}", method, path, failure);
                    // Not retried, but the rejected token is dropped so the
                    // next call authenticates again.
                    if matches!(&failure, Failure::Http(h) if h.status == 401) {
                        self.discard_token().await;
                    }
                    return Err(classify(&failure));
                }
            }
        }

        // Unreachable: the last attempt never yields a retry decision
        Err(last_failure
            .map(|f| classify(&f))
            .unwrap_or_else(|| ApiError::connection_failed("No request attempts were made")))
    }

    /// Single attempt without retry.
    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        options: &RequestOptions,
    ) -> std::result::Result<Value, Failure> {
        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Failure::Http(HttpFailure::from_response(response).await?));
        }

        let text = response.text().await?;
        Ok(decode_body(&text))
    }

    /// A 401 means the server no longer accepts the token we hold.
    async fn discard_token(&self) {
        if let Err(e) = self.tokens.revoke_token().await {
            warn!("Failed to discard rejected access token: {}", e);
        }
    }
}

/// Builds the underlying reqwest client from the configuration.
pub(crate) fn build_client(config: &Config, headers: HeaderMap) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .danger_accept_invalid_certs(!config.verify_ssl())
        .build()
        .map_err(|e| ApiError::configuration(format!("failed to build HTTP client: {}", e)))
}
