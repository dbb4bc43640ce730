use serde_json::{Map, Value, json};

use super::{list, map, paginated};
use crate::error::Result;
use crate::http::{HttpClient, Query};
use crate::models::{Collection, PaginatedCollection};

/// Partner account balance.
#[derive(Clone)]
pub struct Balance {
    client: HttpClient,
}

impl Balance {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self) -> Result<Map<String, Value>> {
        let body = self.client.get("/balance", Query::new()).await?;
        Ok(map(body))
    }

    /// Balance movements, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, filters: Query) -> Result<PaginatedCollection<Value>> {
        let body = self.client.get("/balance/history", filters).await?;
        paginated(body, "history")
    }
}

/// Webhook subscriptions.
#[derive(Clone)]
pub struct Webhooks {
    client: HttpClient,
}

impl Webhooks {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn all(&self, filters: Query) -> Result<Collection<Value>> {
        let body = self.client.get("/webhooks", filters).await?;
        list(body, "webhooks")
    }

    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: u64) -> Result<Map<String, Value>> {
        let body = self
            .client
            .get(&format!("/webhooks/{}", id), Query::new())
            .await?;
        Ok(map(body))
    }

    #[tracing::instrument(skip(self, webhook))]
    pub async fn create(&self, webhook: Value) -> Result<Map<String, Value>> {
        let body = self.client.post("/webhooks", webhook).await?;
        Ok(map(body))
    }

    #[tracing::instrument(skip(self, webhook))]
    pub async fn update(&self, id: u64, webhook: Value) -> Result<Map<String, Value>> {
        let body = self
            .client
            .put(&format!("/webhooks/{}", id), webhook)
            .await?;
        Ok(map(body))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<bool> {
        self.client
            .delete(&format!("/webhooks/{}", id), json!({}))
            .await?;
        Ok(true)
    }

    /// Asks the API to fire a test event at the subscription.
    #[tracing::instrument(skip(self))]
    pub async fn test(&self, id: u64) -> Result<Map<String, Value>> {
        let body = self
            .client
            .post(&format!("/webhooks/{}/test", id), json!({}))
            .await?;
        Ok(map(body))
    }
}
