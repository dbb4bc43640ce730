//! SDK configuration.
//!
//! A [`Config`] is built once through [`ConfigBuilder`] and then shared read-only
//! (usually behind an `Arc`) by the token provider and the request executor.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use reqwest::Url;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.touristesim.net/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// SDK version embedded at build time.
pub const SDK_VERSION: &str = env!("TOURISTESIM_VERSION");

/// API environment. Informational only: the base URL decides where requests go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sandbox,
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sandbox => "sandbox",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Mode::Sandbox),
            "production" => Ok(Mode::Production),
            other => Err(ApiError::configuration(format!(
                "Unknown mode '{}'. Expected 'sandbox' or 'production'.",
                other
            ))),
        }
    }
}

/// Immutable SDK configuration.
#[derive(Clone)]
pub struct Config {
    client_id: String,
    client_secret: String,
    base_url: String,
    oauth_token_url: Option<String>,
    mode: Mode,
    timeout: Duration,
    connect_timeout: Duration,
    verify_ssl: bool,
    user_agent: String,
    max_retries: u32,
    retry_base_delay: Duration,
    cache_ttl: Duration,
}

impl Config {
    /// Configuration with all defaults for the given credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::builder(client_id, client_secret).build()
    }

    pub fn builder(client_id: impl Into<String>, client_secret: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(client_id, client_secret)
    }

    /// Builds a configuration from `TOURISTESIM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, using the same keys
    /// as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("TOURISTESIM_CLIENT_ID")
            .ok_or_else(|| ApiError::configuration("TOURISTESIM_CLIENT_ID is not set"))?;
        let client_secret = lookup("TOURISTESIM_CLIENT_SECRET")
            .ok_or_else(|| ApiError::configuration("TOURISTESIM_CLIENT_SECRET is not set"))?;

        let mut builder = Self::builder(client_id, client_secret);
        if let Some(base_url) = lookup("TOURISTESIM_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        if let Some(mode) = lookup("TOURISTESIM_MODE") {
            builder = builder.mode(mode.parse()?);
        }
        builder.build()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_sandbox(&self) -> bool {
        self.mode == Mode::Sandbox
    }

    pub fn is_production(&self) -> bool {
        self.mode == Mode::Production
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// OAuth token endpoint.
    ///
    /// Unless overridden, this is derived as a sibling of the versioned API root
    /// (`<base_url>/../oauth/token`). The `..` segment is resolved by URL parsing
    /// when the request is sent, so the derivation only holds while the base URL
    /// is exactly one path segment below the OAuth root.
    pub fn oauth_token_url(&self) -> String {
        match &self.oauth_token_url {
            Some(url) => url.clone(),
            None => format!("{}/../oauth/token", self.base_url),
        }
    }

    /// Absolute URL for an API path relative to the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .field("base_url", &self.base_url)
            .field("oauth_token_url", &self.oauth_token_url())
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("verify_ssl", &self.verify_ssl)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    client_id: String,
    client_secret: String,
    base_url: Option<String>,
    oauth_token_url: Option<String>,
    mode: Mode,
    timeout: Duration,
    connect_timeout: Duration,
    verify_ssl: bool,
    user_agent: Option<String>,
    max_retries: u32,
    retry_base_delay: Duration,
    cache_ttl: Duration,
}

impl ConfigBuilder {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: None,
            oauth_token_url: None,
            mode: Mode::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            verify_ssl: true,
            user_agent: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the derived OAuth token endpoint.
    pub fn oauth_token_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_token_url = Some(url.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.client_id.trim().is_empty() {
            return Err(ApiError::configuration("client id must not be empty"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ApiError::configuration("client secret must not be empty"));
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| {
            ApiError::configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;

        if let Some(url) = &self.oauth_token_url {
            Url::parse(url).map_err(|e| {
                ApiError::configuration(format!("invalid OAuth token URL '{}': {}", url, e))
            })?;
        }

        let user_agent = self.user_agent.unwrap_or_else(default_user_agent);

        let config = Config {
            client_id: self.client_id,
            client_secret: self.client_secret,
            base_url,
            oauth_token_url: self.oauth_token_url,
            mode: self.mode,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            verify_ssl: self.verify_ssl,
            user_agent,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            cache_ttl: self.cache_ttl,
        };
        debug!("Built configuration: {:?}", config);
        Ok(config)
    }
}

fn default_user_agent() -> String {
    format!(
        "TouristeSIM-SDK/{} (Rust/{})",
        SDK_VERSION,
        env!("TOURISTESIM_RUSTC_VERSION")
    )
}
