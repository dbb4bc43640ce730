//! Time-bounded token store.
//!
//! Entries expire after the store-wide TTL, independently of the expiry carried
//! by the token itself. A background task sweeps expired entries on a fixed
//! interval so memory stays bounded even when nothing reads the cache.

use std::time::Duration;

use log::{debug, trace};
use moka::sync::Cache;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::token::Token;
use crate::config::DEFAULT_CACHE_TTL;

/// Interval between background sweeps. Independent of the TTL.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(120);

pub struct TokenCache {
    entries: Cache<String, Value>,
    ttl: Duration,
    sweeper: Option<JoinHandle<()>>,
}

impl TokenCache {
    /// Creates a cache whose entries live for `ttl`.
    ///
    /// When called inside a tokio runtime, the periodic sweep is started on it.
    /// Outside a runtime, expired entries are still never returned but are only
    /// reclaimed on access or by calling [`TokenCache::sweep`].
    pub fn new(ttl: Duration) -> Self {
        let entries: Cache<String, Value> = Cache::builder().time_to_live(ttl).build();

        let sweeper = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let entries = entries.clone();
            handle.spawn(async move {
                let mut interval = tokio::time::interval(SWEEP_INTERVAL);
                // The first tick completes immediately
                interval.tick().await;
                loop {
                    interval.tick().await;
                    entries.run_pending_tasks();
                    trace!("Token cache swept, {} entries left", entries.entry_count());
                }
            })
        });

        Self {
            entries,
            ttl,
            sweeper,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached token, or `None` on a miss or an unreadable entry.
    pub fn get(&self, key: &str) -> Option<Token> {
        let value = self.entries.get(key)?;
        match Token::from_json(&value) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!("Ignoring malformed cache entry '{}': {}", key, e);
                None
            }
        }
    }

    pub fn store(&self, key: &str, token: &Token) {
        self.entries.insert(key.to_string(), token.to_json());
    }

    /// Stores a raw payload. Used for entries not produced by [`Token::to_json`].
    pub fn store_raw(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn forget(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn flush(&self) {
        self.entries.invalidate_all();
    }

    /// Evicts expired entries now.
    pub fn sweep(&self) {
        self.entries.run_pending_tasks();
    }

    /// Approximate number of live entries; exact right after [`TokenCache::sweep`].
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl Drop for TokenCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenResponse;
    use serde_json::json;

    fn token(access_token: &str) -> Token {
        Token::from_response(TokenResponse {
            access_token: access_token.to_string(),
            token_type: None,
            expires_in: Some(3600),
        })
    }

    #[test]
    fn test_store_then_get() {
        let cache = TokenCache::default();
        let original = token("abc");
        cache.store("oauth_token", &original);

        let cached = cache.get("oauth_token").unwrap();
        assert_eq!(cached, original);
        assert!(cache.has("oauth_token"));
    }

    #[test]
    fn test_forget() {
        let cache = TokenCache::default();
        cache.store("oauth_token", &token("abc"));
        cache.forget("oauth_token");
        assert!(cache.get("oauth_token").is_none());
        assert!(!cache.has("oauth_token"));
    }

    #[test]
    fn test_unknown_key() {
        let cache = TokenCache::default();
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_flush() {
        let cache = TokenCache::default();
        cache.store("a", &token("1"));
        cache.store("b", &token("2"));
        cache.flush();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let cache = TokenCache::default();
        cache.store_raw("oauth_token", json!({"token_type": "Bearer"}));
        assert!(cache.get("oauth_token").is_none());

        cache.store_raw("oauth_token", json!("not-an-object"));
        assert!(cache.get("oauth_token").is_none());
    }

    #[test]
    fn test_overwrite_replaces_whole_entry() {
        let cache = TokenCache::default();
        cache.store("oauth_token", &token("first"));
        cache.store("oauth_token", &token("second"));
        assert_eq!(cache.get("oauth_token").unwrap().access_token(), "second");
    }

    #[test]
    fn test_cache_ttl_is_independent_of_token_expiry() {
        let cache = TokenCache::new(Duration::from_millis(200));
        let long_lived = token("abc");
        cache.store("oauth_token", &long_lived);

        std::thread::sleep(Duration::from_millis(400));

        assert!(!long_lived.is_expired());
        assert!(cache.get("oauth_token").is_none());
    }

    #[test]
    fn test_sweep_reclaims_expired_entries() {
        let cache = TokenCache::new(Duration::from_millis(100));
        cache.store("a", &token("1"));
        cache.store("b", &token("2"));
        cache.sweep();
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(250));
        cache.sweep();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_background_sweeper_runs_inside_runtime() {
        let cache = TokenCache::new(Duration::from_secs(60));
        assert!(cache.sweeper.is_some());
        cache.store("oauth_token", &token("abc"));
        assert!(cache.get("oauth_token").is_some());
    }

    #[test]
    fn test_no_sweeper_outside_runtime() {
        let cache = TokenCache::new(Duration::from_secs(60));
        assert!(cache.sweeper.is_none());
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }
}
