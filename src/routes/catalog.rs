//! Public catalog routes: products, categories, brands and deals

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::catalog::{
    build_category_tree, Brand, Category, Deal, DealResponse, Product, ProductDetail,
    ProductQuery, TechnicalDetail, TechnicalDetails,
};
use crate::error::ApiError;
use crate::services::cache::{get_or_load, keys};

/// Product listing columns with shop, category, brand and rating joins.
/// Shared by every route that returns `Product`.
pub(crate) const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id, p.seller_id, s.shop_name,
        p.category_id, c.name AS category_name,
        p.subcategory_id, p.brand_id, b.name AS brand_name,
        p.name, p.description, p.price, p.mrp, p.stock, p.images,
        p.gst_rate, p.hsn_code, p.status, p.is_featured,
        r.average_rating, COALESCE(r.review_count, 0) AS review_count,
        p.created_at, p.updated_at
    FROM products p
    JOIN sellers s ON s.id = p.seller_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN brands b ON b.id = p.brand_id
    LEFT JOIN (
        SELECT product_id, AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count
        FROM reviews
        GROUP BY product_id
    ) r ON r.product_id = p.id
"#;

/// Filters shared by the listing and its count. Binds $1..$8.
const PRODUCT_FILTERS: &str = r#"
    p.status = 'active'
    AND s.onboarding_status = 'approved'
    AND ($1::uuid IS NULL OR p.category_id = $1 OR p.subcategory_id = $1)
    AND ($2::uuid IS NULL OR p.subcategory_id = $2)
    AND ($3::uuid IS NULL OR p.brand_id = $3)
    AND ($4::uuid IS NULL OR p.seller_id = $4)
    AND ($5::text IS NULL OR p.name ILIKE '%' || $5 || '%' OR p.description ILIKE '%' || $5 || '%')
    AND ($6::numeric IS NULL OR p.price >= $6)
    AND ($7::numeric IS NULL OR p.price <= $7)
    AND ($8::bool IS NULL OR p.is_featured = $8)
"#;

/// Paginated listing of active products from approved shops.
pub(crate) async fn list_active_products(
    db: &PgPool,
    filter: &ProductQuery,
    pagination: &PaginationParams,
) -> Result<Paginated<Product>, ApiError> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let total: i64 = sqlx::query_scalar(&format!(
        r#"
        SELECT COUNT(*)
        FROM products p
        JOIN sellers s ON s.id = p.seller_id
        WHERE {}
        "#,
        PRODUCT_FILTERS
    ))
    .bind(filter.category_id)
    .bind(filter.subcategory_id)
    .bind(filter.brand_id)
    .bind(filter.seller_id)
    .bind(search)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .bind(filter.featured)
    .fetch_one(db)
    .await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "{} WHERE {} ORDER BY {} LIMIT $9 OFFSET $10",
        PRODUCT_SELECT,
        PRODUCT_FILTERS,
        filter.order_clause()
    ))
    .bind(filter.category_id)
    .bind(filter.subcategory_id)
    .bind(filter.brand_id)
    .bind(filter.seller_id)
    .bind(search)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .bind(filter.featured)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(db)
    .await?;

    Ok(Paginated::new(products, pagination, total))
}

/// Ordered technical detail rows for a product.
pub(crate) async fn load_technical_details(
    db: &PgPool,
    product_id: Uuid,
) -> Result<(Vec<TechnicalDetail>, Option<DateTime<Utc>>), ApiError> {
    let rows: Vec<(String, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT key, value, updated_at
        FROM product_technical_details
        WHERE product_id = $1
        ORDER BY position
        "#,
    )
    .bind(product_id)
    .fetch_all(db)
    .await?;

    let updated_at = rows.iter().map(|(_, _, at)| *at).max();
    let details = rows
        .into_iter()
        .map(|(key, value, _)| TechnicalDetail { key, value })
        .collect();
    Ok((details, updated_at))
}

/// Fetch a product visible to shoppers.
async fn find_active_product(db: &PgPool, product_id: Uuid) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>(&format!(
        "{} WHERE p.id = $1 AND p.status = 'active' AND s.onboarding_status = 'approved'",
        PRODUCT_SELECT
    ))
    .bind(product_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))
}

// ============================================================================
// Products
// ============================================================================

/// GET /api/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = list_active_products(&state.db, &filter, &pagination).await?;
    Ok(Json(page))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = find_active_product(&state.db, product_id).await?;
    let (technical_details, _) = load_technical_details(&state.db, product_id).await?;

    Ok(Json(DataResponse::new(ProductDetail {
        discount_percent: product.discount_percent(),
        product,
        technical_details,
    })))
}

/// GET /api/products/:id/technical-details
pub async fn get_technical_details(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    find_active_product(&state.db, product_id).await?;
    let (details, updated_at) = load_technical_details(&state.db, product_id).await?;

    Ok(Json(DataResponse::new(TechnicalDetails {
        product_id,
        details,
        updated_at,
    })))
}

// ============================================================================
// Categories & Brands
// ============================================================================

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tree = get_or_load(state.cache(), keys::CATEGORY_TREE, || async {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, parent_id, image_url, is_active
            FROM categories
            WHERE is_active
            ORDER BY name
            "#,
        )
        .fetch_all(&state.db)
        .await?;
        Ok::<_, ApiError>(build_category_tree(categories))
    })
    .await?;

    Ok(Json(DataResponse::new(tree)))
}

/// GET /api/brands
pub async fn list_brands(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let brands = get_or_load(state.cache(), keys::BRANDS, || async {
        let brands =
            sqlx::query_as::<_, Brand>("SELECT id, name, logo_url FROM brands ORDER BY name")
                .fetch_all(&state.db)
                .await?;
        Ok::<_, ApiError>(brands)
    })
    .await?;

    Ok(Json(DataResponse::new(brands)))
}

// ============================================================================
// Deals
// ============================================================================

/// GET /api/deals
///
/// Deals running right now on active products.
pub async fn list_deals(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let deals = sqlx::query_as::<_, Deal>(
        r#"
        SELECT
            d.id, d.product_id, d.title, d.discount_percentage, d.starts_at, d.ends_at,
            p.name AS product_name, p.price, p.mrp, p.images, s.shop_name
        FROM deals d
        JOIN products p ON p.id = d.product_id
        JOIN sellers s ON s.id = p.seller_id
        WHERE d.is_active
          AND NOW() BETWEEN d.starts_at AND d.ends_at
          AND p.status = 'active'
          AND s.onboarding_status = 'approved'
        ORDER BY d.discount_percentage DESC, d.ends_at ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let deals: Vec<DealResponse> = deals.into_iter().map(DealResponse::from).collect();
    Ok(Json(DataResponse::new(deals)))
}
