//! OAuth authentication: tokens, the token cache and the token provider.

mod cache;
mod oauth;
mod token;

pub use cache::{SWEEP_INTERVAL, TokenCache};
#[cfg(test)]
pub use oauth::MockTokenProvider;
pub use oauth::{OAuthClient, TOKEN_CACHE_KEY, TokenProvider};
pub use token::{
    DEFAULT_EXPIRES_IN_SECS, DEFAULT_TOKEN_TYPE, EXPIRATION_BUFFER_SECS, Token, TokenResponse,
};
