//! Endpoint wrappers grouped by API resource.
//!
//! Every response arrives in a `{"data": ...}` envelope. The helpers here
//! unwrap it and decode the payload into the typed models.

mod account;
mod countries;
mod esims;
mod orders;
mod plans;

pub use account::{Balance, Webhooks};
pub use countries::{Countries, Regions};
pub use esims::Esims;
pub use orders::Orders;
pub use plans::Plans;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};
use crate::http::Query;
use crate::models::{Collection, PaginatedCollection, PaginationMeta};

/// Default page size for the convenience plan listings.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Takes the `data` member out of a response body.
fn data(mut body: Value) -> Value {
    match body.get_mut("data") {
        Some(data) => data.take(),
        None => Value::Null,
    }
}

/// Takes `data.<key>` out of a response body.
fn data_member(body: &mut Value, key: &str) -> Value {
    body.get_mut("data")
        .and_then(|data| data.get_mut(key))
        .map(Value::take)
        .unwrap_or(Value::Null)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| ApiError::Api {
        message: format!("Unexpected response payload: {}", e),
        status: 200,
        response: Some(value),
    })
}

/// Decodes `data` as a single model.
fn object<T: DeserializeOwned>(body: Value) -> Result<T> {
    decode(data(body))
}

/// `data` as a JSON object, empty when absent.
fn map(body: Value) -> Map<String, Value> {
    match data(body) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Decodes the `data.<key>` array. A missing array is an empty collection.
fn list<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<Collection<T>> {
    match data_member(&mut body, key) {
        Value::Null => Ok(Collection::default()),
        items => decode::<Vec<T>>(items).map(Collection::new),
    }
}

/// Decodes the `data.<key>` array together with `data.pagination`.
fn paginated<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<PaginatedCollection<T>> {
    let pagination = match data_member(&mut body, "pagination") {
        Value::Null => PaginationMeta::default(),
        meta => decode(meta)?,
    };
    let items = list(body, key)?;
    Ok(PaginatedCollection::new(items.into_inner(), pagination))
}

fn query(pairs: &[(&str, String)]) -> Query {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::auth::{MockTokenProvider, TokenProvider};
    use crate::config::Config;
    use crate::http::HttpClient;

    /// Executor against a mockito server that authenticates `token_calls` times.
    pub fn client(base: &str, token_calls: usize) -> HttpClient {
        let config = Config::builder("id", "secret")
            .base_url(format!("{}/v1", base))
            .max_retries(0)
            .retry_base_delay(Duration::from_millis(1))
            .build()
            .unwrap();
        let mut tokens = MockTokenProvider::new();
        tokens
            .expect_get_token()
            .times(token_calls)
            .returning(|| Ok("test-token".to_string()));
        let tokens: Arc<dyn TokenProvider> = Arc::new(tokens);
        HttpClient::new(Arc::new(config), tokens).unwrap()
    }
}
