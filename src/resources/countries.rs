use serde_json::Value;

use super::{list, object, query};
use crate::error::Result;
use crate::http::{HttpClient, Query};
use crate::models::{Collection, Country};

/// Countries with eSIM coverage.
#[derive(Clone)]
pub struct Countries {
    client: HttpClient,
}

impl Countries {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn all(&self, filters: Query) -> Result<Collection<Country>> {
        let body = self.client.get("/countries", filters).await?;
        list(body, "countries")
    }

    /// Looks a country up by ISO code. `Ok(None)` when the API doesn't know it.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, code: &str) -> Result<Option<Country>> {
        match self
            .client
            .get(&format!("/countries/{}", code), Query::new())
            .await
        {
            Ok(body) => object(body).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn search(&self, term: &str) -> Result<Collection<Country>> {
        self.all(query(&[("search", term.to_string())])).await
    }

    pub async fn by_region(&self, slug: &str) -> Result<Collection<Country>> {
        self.all(query(&[("region", slug.to_string())])).await
    }

    pub async fn featured(&self) -> Result<Collection<Country>> {
        self.all(query(&[("featured", "true".to_string())])).await
    }
}

/// Coverage regions.
#[derive(Clone)]
pub struct Regions {
    client: HttpClient,
}

impl Regions {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Regions are returned untyped; their shape varies between plans.
    #[tracing::instrument(skip(self))]
    pub async fn all(&self) -> Result<Collection<Value>> {
        let body = self.client.get("/regions", Query::new()).await?;
        list(body, "regions")
    }
}
