use uuid::Uuid;

use crate::api::{Paginated, PaginationParams};
use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::catalog::{Product, ProductQuery};
use crate::domain::sellers::{Store, StoreQuery};

impl ApiClient {
    pub async fn get_stores(
        &self,
        query: &StoreQuery,
        pagination: PaginationParams,
    ) -> Result<Paginated<Store>, ClientError> {
        self.get_page("/stores", query, pagination).await
    }

    pub async fn get_store(&self, store_id: Uuid) -> Result<Store, ClientError> {
        self.get(&format!("/stores/{}", store_id)).await
    }

    pub async fn get_store_products(
        &self,
        store_id: Uuid,
        query: &ProductQuery,
        pagination: PaginationParams,
    ) -> Result<Paginated<Product>, ClientError> {
        self.get_page(&format!("/stores/{}/products", store_id), query, pagination)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::test_support::harness;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn filters_and_pagination_go_in_the_query() {
        let server = MockServer::start().await;
        let location = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/stores"))
            .and(query_param("location_id", location.to_string()))
            .and(query_param("city", "Pune"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "pagination": {
                    "page": 2, "per_page": 10, "total_items": 12,
                    "total_pages": 2, "has_next": false, "has_prev": true
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "/shops");
        let query = StoreQuery {
            location_id: Some(location),
            city: Some("Pune".into()),
            ..StoreQuery::default()
        };
        let page = h
            .client
            .get_stores(&query, PaginationParams::new(2, 10))
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_items, 12);
    }
}
