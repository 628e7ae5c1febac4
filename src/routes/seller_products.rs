//! Seller product management
//!
//! Products are authored through the step-wise product wizard. The client may
//! validate each step as it goes; the final submission is re-validated here
//! against every step's rules before anything is written.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireSeller;
use crate::domain::catalog::{
    CreateProductRequest, Product, ProductStatus, TechnicalDetail, TechnicalDetails,
    UpdateProductRequest, UpdateTechnicalDetailsRequest, ValidateStepRequest,
};
use crate::domain::sellers::{OnboardingStatus, SellerRow};
use crate::error::ApiError;
use crate::validation::ValidationErrors;
use crate::wizard::steps::{product_steps, ProductRules, TECHNICAL_DETAILS};
use crate::wizard::{Wizard, WizardError};

use super::catalog::{load_technical_details, PRODUCT_SELECT};
use super::onboarding::load_seller;

/// The caller's shop, which must be approved before it can sell.
async fn approved_seller(db: &PgPool, user_id: Uuid) -> Result<SellerRow, ApiError> {
    let seller = load_seller(db, user_id).await?;
    if OnboardingStatus::from(seller.onboarding_status.clone()) != OnboardingStatus::Approved {
        return Err(ApiError::forbidden(
            "Your shop must be approved before you can manage products",
        ));
    }
    Ok(seller)
}

/// A product owned by the given shop, in any status.
async fn find_own_product(db: &PgPool, seller_id: Uuid, product_id: Uuid) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>(&format!(
        "{} WHERE p.id = $1 AND p.seller_id = $2",
        PRODUCT_SELECT
    ))
    .bind(product_id)
    .bind(seller_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// Run every product step's rules over one merged form.
fn validate_product(form: &Value) -> Result<(), ApiError> {
    let wizard = Wizard::new(product_steps(), true, ProductRules)?;
    let mut errors = ValidationErrors::default();

    for step in wizard.steps() {
        match wizard.validate_step(&step.key, form) {
            Ok(()) => {}
            Err(WizardError::Invalid(_, step_errors)) => errors.merge(step_errors),
            Err(other) => return Err(other.into()),
        }
    }

    errors.into_result()?;
    Ok(())
}

fn validate_details(details: &[TechnicalDetail]) -> Result<(), ApiError> {
    let wizard = Wizard::new(product_steps(), true, ProductRules)?;
    wizard.validate_step(TECHNICAL_DETAILS, &json!({ "technical_details": details }))?;
    Ok(())
}

fn parse_product<T: serde::de::DeserializeOwned>(form: Value) -> Result<T, ApiError> {
    serde_json::from_value(form)
        .map_err(|e| ApiError::bad_request(format!("Malformed product data: {}", e)))
}

/// Replace a product's specification rows, keeping their order.
async fn replace_technical_details(
    conn: &mut PgConnection,
    product_id: Uuid,
    details: &[TechnicalDetail],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM product_technical_details WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for (position, detail) in details.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO product_technical_details (product_id, position, key, value)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(product_id)
        .bind(position as i32)
        .bind(detail.key.trim())
        .bind(detail.value.trim())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Stored product as a wizard form, so partial updates validate as a whole.
fn product_form(product: &Product) -> Value {
    json!({
        "name": product.name,
        "description": product.description,
        "category_id": product.category_id,
        "subcategory_id": product.subcategory_id,
        "brand_id": product.brand_id,
        "price": product.price,
        "mrp": product.mrp,
        "stock": product.stock,
        "images": product.images,
        // NUMERIC(5,2) reads back as 18.00
        "gst_rate": product.gst_rate.normalize().to_string(),
        "hsn_code": product.hsn_code,
    })
}

// ============================================================================
// Products
// ============================================================================

/// GET /api/seller/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = load_seller(&state.db, seller.user_id()).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE seller_id = $1")
        .bind(shop.id)
        .fetch_one(&state.db)
        .await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "{} WHERE p.seller_id = $1 ORDER BY p.created_at DESC LIMIT $2 OFFSET $3",
        PRODUCT_SELECT
    ))
    .bind(shop.id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(Paginated::new(products, &pagination, total)))
}

/// POST /api/seller/products/validate-step
///
/// Check one wizard step without saving anything.
pub async fn validate_step(
    _seller: RequireSeller,
    Json(req): Json<ValidateStepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wizard = Wizard::new(product_steps(), true, ProductRules)?;
    wizard.validate_step(&req.step, &req.data)?;
    Ok(Json(DataResponse::new(json!({ "step": req.step, "valid": true }))))
}

/// POST /api/seller/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Json(form): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    validate_product(&form)?;
    let req: CreateProductRequest = parse_product(form)?;

    let shop = approved_seller(&state.db, seller.user_id()).await?;
    let status = req.status.unwrap_or(ProductStatus::Active);

    let mut tx = state.db.begin().await?;

    let product_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO products (
            seller_id, category_id, subcategory_id, brand_id, name, description,
            price, mrp, stock, images, gst_rate, hsn_code, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(shop.id)
    .bind(req.category_id)
    .bind(req.subcategory_id)
    .bind(req.brand_id)
    .bind(req.name.trim())
    .bind(req.description.trim())
    .bind(req.price)
    .bind(req.mrp)
    .bind(req.stock)
    .bind(&req.images)
    .bind(req.gst_rate)
    .bind(&req.hsn_code)
    .bind(status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    replace_technical_details(&mut *tx, product_id, &req.technical_details).await?;
    tx.commit().await?;

    tracing::info!(user_id = %seller.user_id(), product_id = %product_id, "Product created");

    let product = find_own_product(&state.db, shop.id, product_id).await?;
    Ok(Created(product))
}

/// PUT /api/seller/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Path(product_id): Path<Uuid>,
    Json(changes): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = approved_seller(&state.db, seller.user_id()).await?;
    let existing = find_own_product(&state.db, shop.id, product_id).await?;

    let mut form = product_form(&existing);
    if let (Some(target), Some(fields)) = (form.as_object_mut(), changes.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    validate_product(&form)?;
    let req: UpdateProductRequest = parse_product(changes)?;

    sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            category_id = COALESCE($5, category_id),
            subcategory_id = COALESCE($6, subcategory_id),
            brand_id = COALESCE($7, brand_id),
            price = COALESCE($8, price),
            mrp = COALESCE($9, mrp),
            stock = COALESCE($10, stock),
            images = COALESCE($11, images),
            gst_rate = COALESCE($12, gst_rate),
            hsn_code = COALESCE($13, hsn_code),
            status = COALESCE($14, status),
            updated_at = NOW()
        WHERE id = $1 AND seller_id = $2
        "#,
    )
    .bind(product_id)
    .bind(shop.id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.description.as_deref().map(str::trim))
    .bind(req.category_id)
    .bind(req.subcategory_id)
    .bind(req.brand_id)
    .bind(req.price)
    .bind(req.mrp)
    .bind(req.stock)
    .bind(&req.images)
    .bind(req.gst_rate)
    .bind(&req.hsn_code)
    .bind(req.status.map(|s| s.as_str()))
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = %seller.user_id(), product_id = %product_id, "Product updated");

    let product = find_own_product(&state.db, shop.id, product_id).await?;
    Ok(Json(DataResponse::new(product)))
}

/// DELETE /api/seller/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let shop = load_seller(&state.db, seller.user_id()).await?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND seller_id = $2")
        .bind(product_id)
        .bind(shop.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    tracing::info!(user_id = %seller.user_id(), product_id = %product_id, "Product deleted");

    Ok(NoContent)
}

/// PUT /api/seller/products/:id/technical-details
pub async fn update_technical_details(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateTechnicalDetailsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_details(&req.details)?;

    let shop = approved_seller(&state.db, seller.user_id()).await?;
    find_own_product(&state.db, shop.id, product_id).await?;

    let mut tx = state.db.begin().await?;
    replace_technical_details(&mut *tx, product_id, &req.details).await?;
    sqlx::query("UPDATE products SET updated_at = NOW() WHERE id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let (details, updated_at) = load_technical_details(&state.db, product_id).await?;
    Ok(Json(DataResponse::new(TechnicalDetails {
        product_id,
        details,
        updated_at,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn complete_form() -> Value {
        json!({
            "name": "Steel Bottle",
            "description": "Insulated 1L steel bottle",
            "category_id": Uuid::new_v4(),
            "price": "499",
            "mrp": "599",
            "stock": 10,
            "images": ["/uploads/bottle.jpg"],
            "gst_rate": "18",
            "technical_details": [{"key": "Capacity", "value": "1L"}]
        })
    }

    fn errors_of(result: Result<(), ApiError>) -> ValidationErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn complete_product_passes_all_steps() {
        let form = complete_form();
        validate_product(&form).unwrap();

        let req: CreateProductRequest = parse_product(form).unwrap();
        assert_eq!(req.price, Decimal::from(499));
        assert_eq!(req.technical_details.len(), 1);
    }

    #[test]
    fn errors_from_every_step_are_collected() {
        let errors = errors_of(validate_product(&json!({"gst_rate": "7"})));
        for field in ["name", "description", "category_id", "price", "stock", "images", "gst_rate"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn incomplete_technical_rows_are_rejected() {
        let details = vec![TechnicalDetail {
            key: "Material".into(),
            value: " ".into(),
        }];
        assert!(matches!(
            validate_details(&details),
            Err(ApiError::Validation(_))
        ));
        assert!(validate_details(&[]).is_ok());
    }

    #[test]
    fn stored_product_round_trips_through_the_form() {
        let product = Product {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            shop_name: Some("Corner Store".into()),
            category_id: Uuid::new_v4(),
            category_name: None,
            subcategory_id: None,
            brand_id: None,
            brand_name: None,
            name: "Steel Bottle".into(),
            description: "Insulated 1L steel bottle".into(),
            price: Decimal::from_str("499.00").unwrap(),
            mrp: None,
            stock: 4,
            images: vec!["/uploads/bottle.jpg".into()],
            gst_rate: Decimal::from_str("18.00").unwrap(),
            hsn_code: Some("7323".into()),
            status: "active".into(),
            is_featured: false,
            average_rating: None,
            review_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let form = product_form(&product);
        assert_eq!(form["gst_rate"], "18");
        validate_product(&form).unwrap();
    }
}
