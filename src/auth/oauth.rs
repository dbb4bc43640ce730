//! OAuth2 client-credentials token provider.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use super::cache::TokenCache;
use super::token::{Token, TokenResponse};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::http::{Failure, HttpFailure, build_client, classify};

/// Cache key the provider stores its token under.
pub const TOKEN_CACHE_KEY: &str = "oauth_token";

/// Source of bearer tokens for the request executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Access token string for the `Authorization` header.
    async fn get_token(&self) -> Result<String>;

    /// A non-expired token, reusing a held or cached one when possible.
    async fn get_valid_token(&self) -> Result<Token>;

    /// Drops any held or cached token so the next call fetches a fresh one.
    async fn revoke_token(&self) -> Result<bool>;
}

pub struct OAuthClient {
    config: Arc<Config>,
    client: Client,
    token: RwLock<Option<Token>>,
    cache: TokenCache,
    refresh: Mutex<()>,
}

impl OAuthClient {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let cache = TokenCache::new(config.cache_ttl());
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: Arc<Config>, cache: TokenCache) -> Result<Self> {
        let client = build_client(&config, HeaderMap::new())?;
        Ok(Self {
            config,
            client,
            token: RwLock::new(None),
            cache,
            refresh: Mutex::new(()),
        })
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Token held in-process, expired or not.
    pub fn current_token(&self) -> Option<Token> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current_token(&self, token: Option<Token>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    /// In-process token first, then the cache. A cache hit becomes the
    /// in-process token.
    fn reusable_token(&self) -> Option<Token> {
        if let Some(token) = self.current_token().filter(|t| !t.is_expired()) {
            return Some(token);
        }

        let cached = self.cache.get(TOKEN_CACHE_KEY).filter(|t| !t.is_expired())?;
        debug!("Using cached access token");
        self.set_current_token(Some(cached.clone()));
        Some(cached)
    }

    /// Performs the client-credentials grant. Never retried.
    #[tracing::instrument(skip(self))]
    pub async fn request_token(&self) -> Result<Token> {
        let url = self.config.oauth_token_url();
        debug!("Requesting access token from {}...", url);

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id()),
            ("client_secret", self.config.client_secret()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| classify(&Failure::from(e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::invalid_credentials("Invalid client credentials"));
        }
        if !status.is_success() {
            let failure = HttpFailure::from_response(response)
                .await
                .map_err(|t| classify(&Failure::Transport(t)))?;
            return Err(classify(&Failure::Http(failure)));
        }

        let grant: TokenResponse = response.json().await.map_err(|e| ApiError::Api {
            message: format!("Malformed token response: {}", e),
            status: status.as_u16(),
            response: None,
        })?;

        let token = Token::from_response(grant);
        debug!(
            "Obtained {} token valid for {}s",
            token.token_type(),
            token.time_remaining()
        );
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for OAuthClient {
    #[tracing::instrument(skip(self))]
    async fn get_token(&self) -> Result<String> {
        let token = self.get_valid_token().await?;
        Ok(token.access_token().to_string())
    }

    #[tracing::instrument(skip(self))]
    async fn get_valid_token(&self) -> Result<Token> {
        if let Some(token) = self.reusable_token() {
            return Ok(token);
        }

        // Single-flight: callers that queue here pick up the winner's token
        let _guard = self.refresh.lock().await;
        if let Some(token) = self.reusable_token() {
            return Ok(token);
        }

        let token = self.request_token().await?;
        self.set_current_token(Some(token.clone()));
        self.cache.store(TOKEN_CACHE_KEY, &token);
        Ok(token)
    }

    #[tracing::instrument(skip(self))]
    async fn revoke_token(&self) -> Result<bool> {
        debug!("Revoking local access token");
        self.set_current_token(None);
        self.cache.forget(TOKEN_CACHE_KEY);
        Ok(true)
    }
}
