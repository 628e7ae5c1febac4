use uuid::Uuid;

use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::cart::{AddCartItemRequest, Cart, UpdateCartItemRequest};

impl ApiClient {
    pub async fn get_cart(&self) -> Result<Cart, ClientError> {
        self.get("/cart").await
    }

    pub async fn add_to_cart(&self, product_id: Uuid, quantity: i32) -> Result<Cart, ClientError> {
        self.post(
            "/cart/items",
            &AddCartItemRequest {
                product_id,
                quantity,
            },
        )
        .await
    }

    pub async fn update_cart_item(&self, product_id: Uuid, quantity: i32) -> Result<Cart, ClientError> {
        self.put(
            &format!("/cart/items/{}", product_id),
            &UpdateCartItemRequest { quantity },
        )
        .await
    }

    pub async fn remove_cart_item(&self, product_id: Uuid) -> Result<Cart, ClientError> {
        self.delete_for(&format!("/cart/items/{}", product_id)).await
    }

    pub async fn clear_cart(&self) -> Result<(), ClientError> {
        self.delete("/cart").await
    }
}
