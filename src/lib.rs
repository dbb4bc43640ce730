//! Client SDK for the TouristeSIM eSIM provisioning API.
//!
//! ```no_run
//! # async fn run() -> touristesim::Result<()> {
//! let sdk = touristesim::TouristEsim::new("client-id", "client-secret")?;
//! let plans = sdk.plans().by_country("JP", None).await?;
//! for plan in &plans {
//!     println!("{:?} {}", plan.name, plan.price());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod resources;

use std::sync::Arc;

pub use auth::{OAuthClient, Token, TokenCache, TokenProvider};
pub use config::{Config, ConfigBuilder, Mode};
pub use error::{ApiError, ConnectionErrorKind, Result, ServerErrorKind};
pub use http::{HttpClient, Method, Query, RequestOptions};
pub use models::{Collection, Country, Esim, Order, PaginatedCollection, PaginationMeta, Plan};
pub use resources::{Balance, Countries, Esims, Orders, Plans, Regions, Webhooks};

/// SDK version, embedded at build time.
pub const VERSION: &str = config::SDK_VERSION;

/// Entry point wiring configuration, authentication and the resource wrappers.
pub struct TouristEsim {
    config: Arc<Config>,
    oauth: Arc<OAuthClient>,
    http: HttpClient,
}

impl TouristEsim {
    /// Sandbox client with default settings.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::new(client_id, client_secret)?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let oauth = Arc::new(OAuthClient::new(Arc::clone(&config))?);
        let tokens: Arc<dyn TokenProvider> = oauth.clone();
        let http = HttpClient::new(Arc::clone(&config), tokens)?;
        Ok(Self {
            config,
            oauth,
            http,
        })
    }

    pub fn plans(&self) -> Plans {
        Plans::new(self.http.clone())
    }

    pub fn countries(&self) -> Countries {
        Countries::new(self.http.clone())
    }

    pub fn regions(&self) -> Regions {
        Regions::new(self.http.clone())
    }

    pub fn orders(&self) -> Orders {
        Orders::new(self.http.clone())
    }

    pub fn esims(&self) -> Esims {
        Esims::new(self.http.clone())
    }

    pub fn balance(&self) -> Balance {
        Balance::new(self.http.clone())
    }

    pub fn webhooks(&self) -> Webhooks {
        Webhooks::new(self.http.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executor for endpoints without a dedicated wrapper.
    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }
}
