//! Shop directory routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::catalog::ProductQuery;
use crate::domain::sellers::{Store, StoreQuery};
use crate::error::ApiError;

use super::catalog::list_active_products;

const STORE_SELECT: &str = r#"
    SELECT
        s.id, COALESCE(s.shop_name, '') AS shop_name, s.description, s.category,
        s.address, s.city, s.state, s.pincode, s.phone,
        s.opening_time, s.closing_time, s.working_days,
        s.logo_url, s.banner_url, s.location_id,
        (SELECT COUNT(*) FROM products p WHERE p.seller_id = s.id AND p.status = 'active')
            AS product_count
    FROM sellers s
"#;

/// GET /api/stores
///
/// Approved shops, optionally narrowed to a location, city or category.
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<StoreQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let where_clause = r#"
        s.onboarding_status = 'approved'
        AND ($1::uuid IS NULL OR s.location_id = $1)
        AND ($2::text IS NULL OR s.city ILIKE $2)
        AND ($3::text IS NULL OR s.category ILIKE $3)
        AND ($4::text IS NULL OR s.shop_name ILIKE '%' || $4 || '%')
    "#;

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sellers s WHERE {}", where_clause))
            .bind(filter.location_id)
            .bind(&filter.city)
            .bind(&filter.category)
            .bind(search)
            .fetch_one(&state.db)
            .await?;

    let stores = sqlx::query_as::<_, Store>(&format!(
        "{} WHERE {} ORDER BY s.shop_name LIMIT $5 OFFSET $6",
        STORE_SELECT, where_clause
    ))
    .bind(filter.location_id)
    .bind(&filter.city)
    .bind(&filter.category)
    .bind(search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(Paginated::new(stores, &pagination, total)))
}

/// GET /api/stores/:id
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = sqlx::query_as::<_, Store>(&format!(
        "{} WHERE s.id = $1 AND s.onboarding_status = 'approved'",
        STORE_SELECT
    ))
    .bind(store_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Store not found"))?;

    Ok(Json(DataResponse::new(store)))
}

/// GET /api/stores/:id/products
pub async fn list_store_products(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    Query(mut filter): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    filter.seller_id = Some(store_id);
    let page = list_active_products(&state.db, &filter, &pagination).await?;
    Ok(Json(page))
}
