use uuid::Uuid;

use crate::api::{Paginated, PaginationParams};
use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::addresses::{Address, AddressRequest};
use crate::domain::catalog::{Brand, CategoryNode, DealResponse, Product, ProductDetail, ProductQuery};
use crate::domain::locations::Location;

impl ApiClient {
    pub async fn get_products(
        &self,
        query: &ProductQuery,
        pagination: PaginationParams,
    ) -> Result<Paginated<Product>, ClientError> {
        self.get_page("/products", query, pagination).await
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductDetail, ClientError> {
        self.get(&format!("/products/{}", product_id)).await
    }

    pub async fn get_categories(&self) -> Result<Vec<CategoryNode>, ClientError> {
        self.get("/categories").await
    }

    pub async fn get_brands(&self) -> Result<Vec<Brand>, ClientError> {
        self.get("/brands").await
    }

    pub async fn get_deals(&self) -> Result<Vec<DealResponse>, ClientError> {
        self.get("/deals").await
    }

    pub async fn get_locations(&self) -> Result<Vec<Location>, ClientError> {
        self.get("/locations").await
    }

    pub async fn get_addresses(&self) -> Result<Vec<Address>, ClientError> {
        self.get("/addresses").await
    }

    pub async fn create_address(&self, request: &AddressRequest) -> Result<Address, ClientError> {
        self.post("/addresses", request).await
    }

    pub async fn update_address(
        &self,
        address_id: Uuid,
        request: &AddressRequest,
    ) -> Result<Address, ClientError> {
        self.put(&format!("/addresses/{}", address_id), request).await
    }

    pub async fn delete_address(&self, address_id: Uuid) -> Result<(), ClientError> {
        self.delete(&format!("/addresses/{}", address_id)).await
    }

    /// Product images resolved against the API, with the fallback standing in
    /// for a product without any.
    pub fn product_image_urls(&self, product: &Product) -> Vec<String> {
        if product.images.is_empty() {
            return vec![self.config().process_image_url(None)];
        }
        product
            .images
            .iter()
            .map(|image| self.config().process_image_url(Some(image)))
            .collect()
    }
}
