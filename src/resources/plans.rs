use serde_json::{Map, Value, json};

use super::{DEFAULT_PER_PAGE, list, map, object, paginated, query};
use crate::error::Result;
use crate::http::{HttpClient, Query};
use crate::models::{Collection, PaginatedCollection, Plan};

/// Data plans on sale.
#[derive(Clone)]
pub struct Plans {
    client: HttpClient,
}

impl Plans {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// One page of plans matching `filters` (`country`, `region`, `type`, `page`, ...).
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, filters: Query) -> Result<PaginatedCollection<Plan>> {
        let body = self.client.get("/plans", filters).await?;
        paginated(body, "plans")
    }

    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: u64) -> Result<Plan> {
        let body = self.client.get(&format!("/plans/{}", id), Query::new()).await?;
        object(body)
    }

    /// Checks that `quantity` units of a plan can be ordered.
    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, plan_id: u64, quantity: u32) -> Result<Map<String, Value>> {
        let body = self
            .client
            .post(
                "/plans/validate",
                json!({ "plan_id": plan_id, "quantity": quantity }),
            )
            .await?;
        Ok(map(body))
    }

    pub async fn by_country(&self, code: &str, per_page: Option<u32>) -> Result<Collection<Plan>> {
        self.listing(query(&[
            ("country", code.to_string()),
            ("per_page", per_page.unwrap_or(DEFAULT_PER_PAGE).to_string()),
        ]))
        .await
    }

    pub async fn by_region(&self, slug: &str, per_page: Option<u32>) -> Result<Collection<Plan>> {
        self.listing(query(&[
            ("region", slug.to_string()),
            ("per_page", per_page.unwrap_or(DEFAULT_PER_PAGE).to_string()),
        ]))
        .await
    }

    pub async fn global(&self, per_page: Option<u32>) -> Result<Collection<Plan>> {
        self.listing(query(&[
            ("type", "global".to_string()),
            ("per_page", per_page.unwrap_or(DEFAULT_PER_PAGE).to_string()),
        ]))
        .await
    }

    async fn listing(&self, filters: Query) -> Result<Collection<Plan>> {
        let body = self.client.get("/plans", filters).await?;
        list(body, "plans")
    }
}
