use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{Paginated, PaginationParams};
use crate::client::errors::ClientError;
use crate::client::http::{ApiClient, NO_FILTER};
use crate::domain::catalog::Product;
use crate::wizard::steps::{product_steps, ProductRules};
use crate::wizard::{StepOutcome, Wizard};

/// A product being built step by step before it is sent.
pub struct ProductDraft {
    wizard: Wizard<ProductRules>,
}

impl ProductDraft {
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self {
            wizard: Wizard::new(product_steps(), true, ProductRules)?,
        })
    }

    pub fn wizard(&self) -> &Wizard<ProductRules> {
        &self.wizard
    }

    pub fn advance(&mut self, data: Value) -> Result<StepOutcome, ClientError> {
        Ok(self.wizard.advance(data)?)
    }

    pub fn skip(&mut self) -> Result<StepOutcome, ClientError> {
        Ok(self.wizard.skip()?)
    }

    pub fn back(&mut self) -> Result<(), ClientError> {
        self.wizard.back()?;
        Ok(())
    }

    /// Everything entered so far as one product form.
    pub fn form(&self) -> Value {
        self.wizard.merged_data()
    }
}

impl ApiClient {
    pub async fn get_seller_products(
        &self,
        pagination: PaginationParams,
    ) -> Result<Paginated<Product>, ClientError> {
        self.get_page("/seller/products", NO_FILTER, pagination).await
    }

    /// Ask the server to validate one step without saving anything.
    pub async fn validate_product_step(&self, step: &str, data: &Value) -> Result<(), ClientError> {
        let _: Value = self
            .post(
                "/seller/products/validate-step",
                &json!({ "step": step, "data": data }),
            )
            .await?;
        Ok(())
    }

    /// Advance a draft, showing each field error when the step is invalid.
    pub fn advance_product_draft(
        &self,
        draft: &mut ProductDraft,
        data: Value,
    ) -> Result<StepOutcome, ClientError> {
        draft.advance(data).map_err(|e| {
            self.report(&e);
            e
        })
    }

    /// Send a finished draft. Required steps must all be completed.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ClientError> {
        let missing: Vec<String> = draft
            .wizard()
            .missing_required()
            .into_iter()
            .map(|s| s.title.clone())
            .collect();
        if !missing.is_empty() {
            let error = ClientError::Form {
                message: format!("Complete these steps first: {}", missing.join(", ")),
                errors: Vec::new(),
            };
            self.report(&error);
            return Err(error);
        }

        self.post("/seller/products", &draft.form()).await
    }

    /// Partial update; only the given fields change.
    pub async fn update_product(&self, product_id: Uuid, changes: &Value) -> Result<Product, ClientError> {
        self.put(&format!("/seller/products/{}", product_id), changes)
            .await
    }

    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ClientError> {
        self.delete(&format!("/seller/products/{}", product_id)).await
    }
}
