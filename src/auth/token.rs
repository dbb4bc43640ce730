//! OAuth bearer token with expiry bookkeeping.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Seconds subtracted from the advertised lifetime so a token is refreshed
/// before the server starts rejecting it.
pub const EXPIRATION_BUFFER_SECS: u64 = 60;

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Body of a successful client-credentials grant.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Cached form of a token. `expires_at` is absent in raw grant responses.
#[derive(Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    access_token: String,
    token_type: String,
    expires_in: u64,
    expires_at: u64,
}

impl Token {
    pub fn from_response(response: TokenResponse) -> Self {
        Self::from_response_at(response, now_secs())
    }

    /// Builds a token as if the grant had been received at `now` (unix seconds).
    pub fn from_response_at(response: TokenResponse, now: u64) -> Self {
        let token_type = response
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        let expires_in = response
            .expires_in
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        Self {
            access_token: response.access_token,
            token_type,
            expires_in,
            expires_at: now
                .saturating_add(expires_in)
                .saturating_sub(EXPIRATION_BUFFER_SECS),
        }
    }

    /// Restores a token from its flat JSON form (see [`Token::to_json`]).
    ///
    /// A stored `expires_at` is kept as-is; without one the expiry is computed
    /// from `expires_in` as for a fresh grant.
    pub fn from_json(value: &Value) -> serde_json::Result<Self> {
        let stored: StoredToken = serde_json::from_value(value.clone())?;
        let mut token = Self::from_response(TokenResponse {
            access_token: stored.access_token,
            token_type: stored.token_type,
            expires_in: stored.expires_in,
        });
        if let Some(expires_at) = stored.expires_at {
            token.expires_at = expires_at;
        }
        Ok(token)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "access_token": self.access_token,
            "token_type": self.token_type,
            "expires_in": self.expires_in,
            "expires_at": self.expires_at,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Absolute expiry in unix seconds, buffer already applied.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Seconds until expiry, clamped to zero.
    pub fn time_remaining(&self) -> u64 {
        self.time_remaining_at(now_secs())
    }

    pub fn time_remaining_at(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc123`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"********")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
