use serde_json::{Map, Value, json};

use super::{data_member, list, map, object, paginated};
use crate::error::Result;
use crate::http::{HttpClient, Query};
use crate::models::{Collection, Esim, PaginatedCollection};

/// Issued eSIM profiles, addressed by ICCID.
#[derive(Clone)]
pub struct Esims {
    client: HttpClient,
}

impl Esims {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn all(&self, filters: Query) -> Result<PaginatedCollection<Esim>> {
        let body = self.client.get("/esims", filters).await?;
        paginated(body, "esims")
    }

    #[tracing::instrument(skip(self))]
    pub async fn find(&self, iccid: &str) -> Result<Esim> {
        let body = self.client.get(&format!("/esims/{}", iccid), Query::new()).await?;
        object(body)
    }

    /// Data consumption figures for a profile.
    #[tracing::instrument(skip(self))]
    pub async fn usage(&self, iccid: &str) -> Result<Map<String, Value>> {
        let body = self
            .client
            .get(&format!("/esims/{}/usage", iccid), Query::new())
            .await?;
        Ok(map(body))
    }

    /// Packages that can be added to a profile.
    #[tracing::instrument(skip(self))]
    pub async fn topup_packages(&self, iccid: &str) -> Result<Collection<Value>> {
        let body = self
            .client
            .get(&format!("/esims/{}/topups", iccid), Query::new())
            .await?;
        list(body, "packages")
    }

    #[tracing::instrument(skip(self))]
    pub async fn topup(&self, iccid: &str, package_id: u64) -> Result<Map<String, Value>> {
        let body = self
            .client
            .post(
                &format!("/esims/{}/topup", iccid),
                json!({ "package_id": package_id }),
            )
            .await?;
        Ok(map(body))
    }

    /// Installation instructions; empty when the API sends none.
    #[tracing::instrument(skip(self))]
    pub async fn instructions(&self, iccid: &str) -> Result<String> {
        let mut body = self
            .client
            .get(&format!("/esims/{}/instructions", iccid), Query::new())
            .await?;
        Ok(match data_member(&mut body, "instructions") {
            Value::String(text) => text,
            _ => String::new(),
        })
    }

    #[tracing::instrument(skip(self, email))]
    pub async fn send_email(&self, iccid: &str, email: &str) -> Result<bool> {
        self.client
            .post(
                &format!("/esims/{}/send-email", iccid),
                json!({ "email": email }),
            )
            .await?;
        Ok(true)
    }
}
