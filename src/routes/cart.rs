//! Shopping cart routes

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireActive;
use crate::domain::cart::{
    AddCartItemRequest, Cart, CartItem, UpdateCartItemRequest, MAX_LINE_QUANTITY,
};
use crate::error::ApiError;
use crate::validation::ValidationErrors;

fn check_quantity(quantity: i32) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        errors.add(
            "quantity",
            format!("Quantity must be between 1 and {}", MAX_LINE_QUANTITY),
        );
    }
    errors.into_result()
}

async fn load_cart(state: &AppState, user_id: Uuid) -> Result<Cart, ApiError> {
    let items = sqlx::query_as::<_, CartItem>(
        r#"
        SELECT
            ci.product_id, ci.quantity,
            p.name, p.price, p.mrp, p.stock, p.images, p.seller_id, s.shop_name
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        JOIN sellers s ON s.id = p.seller_id
        WHERE ci.user_id = $1
        ORDER BY ci.added_at
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Cart::from_items(items))
}

/// Stock of an active product, or 404.
async fn available_stock(state: &AppState, product_id: Uuid) -> Result<i32, ApiError> {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 AND status = 'active'")
        .bind(product_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

fn ensure_stock(stock: i32, wanted: i32) -> Result<(), ApiError> {
    if wanted > stock {
        return Err(ApiError::bad_request(format!(
            "Only {} left in stock",
            stock.max(0)
        )));
    }
    Ok(())
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
) -> Result<impl IntoResponse, ApiError> {
    let cart = load_cart(&state, auth.user_id).await?;
    Ok(Json(DataResponse::new(cart)))
}

/// POST /api/cart/items
///
/// Adding a product already in the cart increases its quantity.
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Json(req): Json<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_quantity(req.quantity)?;

    let stock = available_stock(&state, req.product_id).await?;
    let existing: i32 = sqlx::query_scalar(
        "SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
    )
    .bind(auth.user_id)
    .bind(req.product_id)
    .fetch_optional(&state.db)
    .await?
    .unwrap_or(0);

    let quantity = existing + req.quantity;
    check_quantity(quantity)?;
    ensure_stock(stock, quantity)?;

    sqlx::query(
        r#"
        INSERT INTO cart_items (user_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        "#,
    )
    .bind(auth.user_id)
    .bind(req.product_id)
    .bind(quantity)
    .execute(&state.db)
    .await?;

    tracing::debug!(user_id = %auth.user_id, product_id = %req.product_id, quantity, "Cart item added");

    let cart = load_cart(&state, auth.user_id).await?;
    Ok(Json(DataResponse::new(cart)))
}

/// PUT /api/cart/items/:product_id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_quantity(req.quantity)?;

    let stock = available_stock(&state, product_id).await?;
    ensure_stock(stock, req.quantity)?;

    let updated = sqlx::query(
        "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2",
    )
    .bind(auth.user_id)
    .bind(product_id)
    .bind(req.quantity)
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::not_found("Item is not in your cart"));
    }

    let cart = load_cart(&state, auth.user_id).await?;
    Ok(Json(DataResponse::new(cart)))
}

/// DELETE /api/cart/items/:product_id
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(auth.user_id)
        .bind(product_id)
        .execute(&state.db)
        .await?;

    let cart = load_cart(&state, auth.user_id).await?;
    Ok(Json(DataResponse::new(cart)))
}

/// DELETE /api/cart
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_bounds() {
        assert!(check_quantity(0).is_err());
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn stock_limits_quantity() {
        assert!(ensure_stock(3, 3).is_ok());
        let err = ensure_stock(2, 3).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Only 2 left in stock"));
    }
}
