use serde_json::{Value, json};

use super::{object, paginated};
use crate::error::Result;
use crate::http::{HttpClient, Query};
use crate::models::{Order, PaginatedCollection};

/// Plan purchases.
#[derive(Clone)]
pub struct Orders {
    client: HttpClient,
}

impl Orders {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn all(&self, filters: Query) -> Result<PaginatedCollection<Order>> {
        let body = self.client.get("/orders", filters).await?;
        paginated(body, "orders")
    }

    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: u64) -> Result<Order> {
        let body = self.client.get(&format!("/orders/{}", id), Query::new()).await?;
        object(body)
    }

    /// Places an order. `order` is passed through as the request body.
    #[tracing::instrument(skip(self, order))]
    pub async fn create(&self, order: Value) -> Result<Order> {
        let body = self.client.post("/orders", order).await?;
        object(body)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: u64) -> Result<bool> {
        self.client
            .post(&format!("/orders/{}/cancel", id), json!({}))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::resources::test_support::client;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_all_paginated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/orders")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(
                r#"{"data": {"orders": [{"id": 11, "status": "completed"}],
                    "pagination": {"currentPage": 2, "lastPage": 2}}}"#,
            )
            .create_async()
            .await;

        let page = Orders::new(client(&server.url(), 1))
            .all(vec![("page".to_string(), "2".to_string())])
            .await
            .unwrap();

        assert!(page.is_last_page());
        assert!(!page.has_more());
        assert!(page.items().first().unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/v1/orders")
            .match_body(Matcher::Json(json!({"plan_id": 3, "quantity": 1})))
            .with_status(201)
            .with_body(r#"{"data": {"id": 99, "plan_id": 3, "quantity": 1, "status": "pending"}}"#)
            .create_async()
            .await;
        let find = server
            .mock("GET", "/v1/orders/99")
            .with_status(200)
            .with_body(r#"{"data": {"id": 99, "status": "completed", "total_price": "12.00"}}"#)
            .create_async()
            .await;

        let orders = Orders::new(client(&server.url(), 2));
        let order = orders
            .create(json!({"plan_id": 3, "quantity": 1}))
            .await
            .unwrap();
        assert!(order.is_pending());
        assert_eq!(order.quantity(), 1);

        let order = orders.find(99).await.unwrap();
        assert!(order.is_completed());
        assert_eq!(order.total_price(), 12.0);

        create.assert_async().await;
        find.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/orders")
            .with_status(422)
            .with_body(r#"{"message": "Invalid order", "errors": {"plan_id": ["The plan id field is required."]}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = Orders::new(client(&server.url(), 1))
            .create(json!({}))
            .await
            .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors["plan_id"], "The plan id field is required.");
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_cancel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/orders/5/cancel")
            .with_status(200)
            .with_body(r#"{"data": {}}"#)
            .create_async()
            .await;

        assert!(Orders::new(client(&server.url(), 1)).cancel(5).await.unwrap());
        mock.assert_async().await;
    }
}
