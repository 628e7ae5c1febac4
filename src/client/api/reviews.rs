use uuid::Uuid;

use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::reviews::{CreateReviewRequest, ProductReviews, Review};

impl ApiClient {
    pub async fn get_product_reviews(&self, product_id: Uuid) -> Result<ProductReviews, ClientError> {
        self.get(&format!("/products/{}/reviews", product_id)).await
    }

    pub async fn create_review(
        &self,
        product_id: Uuid,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, ClientError> {
        let request = CreateReviewRequest {
            rating,
            comment: comment.map(str::to_string),
        };
        self.post(&format!("/products/{}/reviews", product_id), &request)
            .await
    }

    pub async fn delete_review(&self, review_id: Uuid) -> Result<(), ClientError> {
        self.delete(&format!("/reviews/{}", review_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::test_support::harness;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn duplicate_review_conflict_is_shown() {
        let server = MockServer::start().await;
        let product_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path(format!("/api/products/{}/reviews", product_id)))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "CONFLICT",
                "message": "You have already reviewed this product"
            })))
            .mount(&server)
            .await;

        let h = harness(&server, &format!("/products/{}", product_id));
        let err = h
            .client
            .create_review(product_id, 5, Some("Great"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "You have already reviewed this product");
    }

    #[tokio::test]
    async fn reviews_come_with_a_summary() {
        let server = MockServer::start().await;
        let product_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/api/products/{}/reviews", product_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
                "summary": {"average_rating": 4.5, "review_count": 2, "distribution": [0, 0, 0, 1, 1]},
                "reviews": []
            }})))
            .mount(&server)
            .await;

        let h = harness(&server, "/");
        let reviews = h.client.get_product_reviews(product_id).await.unwrap();
        assert_eq!(reviews.summary.review_count, 2);
        assert_eq!(reviews.summary.average_rating, Some(4.5));
    }
}
