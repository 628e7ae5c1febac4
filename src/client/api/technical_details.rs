use uuid::Uuid;

use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::catalog::{TechnicalDetail, TechnicalDetails, UpdateTechnicalDetailsRequest};

impl ApiClient {
    pub async fn get_technical_details(&self, product_id: Uuid) -> Result<TechnicalDetails, ClientError> {
        self.get(&format!("/products/{}/technical-details", product_id))
            .await
    }

    /// Replace a product's specification rows. Sellers only.
    pub async fn update_technical_details(
        &self,
        product_id: Uuid,
        details: Vec<TechnicalDetail>,
    ) -> Result<TechnicalDetails, ClientError> {
        self.put(
            &format!("/seller/products/{}/technical-details", product_id),
            &UpdateTechnicalDetailsRequest { details },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::test_support::harness;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn details_are_replaced_in_order() {
        let server = MockServer::start().await;
        let product_id = Uuid::new_v4();
        let rows = json!([
            {"key": "Material", "value": "Cotton"},
            {"key": "Fit", "value": "Regular"}
        ]);
        Mock::given(method("PUT"))
            .and(path(format!("/api/seller/products/{}/technical-details", product_id)))
            .and(body_json(json!({"details": rows})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
                "product_id": product_id,
                "details": rows,
                "updated_at": "2024-06-01T08:30:00Z"
            }})))
            .mount(&server)
            .await;

        let h = harness(&server, "/seller/products");
        let details = vec![
            TechnicalDetail {
                key: "Material".into(),
                value: "Cotton".into(),
            },
            TechnicalDetail {
                key: "Fit".into(),
                value: "Regular".into(),
            },
        ];
        let saved = h
            .client
            .update_technical_details(product_id, details.clone())
            .await
            .unwrap();
        assert_eq!(saved.details, details);
    }
}
