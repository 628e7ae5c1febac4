//! Admin routes
//!
//! Protected admin endpoints for:
//! - User management (role changes, deactivation, deletion)
//! - Product moderation
//! - Serviceable locations
//! - Seller onboarding configuration and the seller review queue
//!
//! All routes require an active admin account. Every mutation is written to
//! the audit log.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::admin::*;
use crate::domain::catalog::Product;
use crate::domain::locations::{Location, LocationRequest};
use crate::domain::onboarding::{
    DocumentType, DocumentTypeRequest, OnboardingStep, UpdateOnboardingConfigRequest,
    UpdateOnboardingStepRequest,
};
use crate::domain::sellers::{OnboardingStatus, Seller, SellerDocument, SellerRow};
use crate::domain::users::{Role, User, UserRow};
use crate::error::ApiError;
use crate::services::cache::{invalidate, keys};
use crate::validation::ValidationErrors;

use super::catalog::PRODUCT_SELECT;
use super::onboarding::fetch_onboarding_config;

// ============================================================================
// Helper Functions
// ============================================================================

/// Record an admin action. Audit failures are logged, never surfaced.
async fn log_admin_action(
    db: &sqlx::PgPool,
    admin_id: Uuid,
    action: AdminAction,
    target_type: AuditTargetType,
    target_id: Option<Uuid>,
    details: serde_json::Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO admin_audit_log (admin_id, action, target_type, target_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(admin_id)
    .bind(action.to_string())
    .bind(target_type.to_string())
    .bind(target_id)
    .bind(details.to_string())
    .execute(db)
    .await;

    match result {
        Ok(_) => tracing::info!(
            admin_id = %admin_id,
            action = %action,
            target_type = %target_type,
            target_id = ?target_id,
            "Admin action logged"
        ),
        Err(e) => tracing::warn!(
            admin_id = %admin_id,
            action = %action,
            error = %e,
            "Failed to write audit log"
        ),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

const USER_COLUMNS: &str =
    "id, name, email, phone, password_hash, role, is_active, created_at, updated_at";

const SELLER_COLUMNS: &str = r#"
    s.id, s.user_id, s.shop_name, s.description, s.category, s.address, s.city, s.state,
    s.pincode, s.phone, s.gst_number, s.opening_time, s.closing_time, s.working_days,
    s.logo_url, s.banner_url, s.location_id, s.onboarding_status, s.completed_steps,
    s.skipped_steps, s.rejection_reason, s.created_at, s.updated_at
"#;

// ============================================================================
// Users
// ============================================================================

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AdminUserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let role = filter.role.map(|r| r.as_str());
    let search = non_blank(&filter.search);

    let where_clause = r#"
        ($1::text IS NULL OR role = $1 OR ($1 = 'customer' AND role = 'user'))
        AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
        AND ($3::bool IS NULL OR is_active = $3)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", where_clause))
        .bind(role)
        .bind(search)
        .bind(filter.is_active)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        USER_COLUMNS, where_clause
    ))
    .bind(role)
    .bind(search)
    .bind(filter.is_active)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(Json(Paginated::new(users, &pagination, total)))
}

/// PATCH /api/admin/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == admin.user_id() && (req.role.is_some_and(|r| r != Role::Admin) || req.is_active == Some(false)) {
        return Err(ApiError::bad_request(
            "You cannot demote or deactivate your own account",
        ));
    }

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users SET
            role = COALESCE($2, role),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(req.role.map(|r| r.as_str()))
    .bind(req.is_active)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    if req.role == Some(Role::Seller) {
        sqlx::query("INSERT INTO sellers (user_id, phone) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .bind(&row.phone)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::UpdateUser,
        AuditTargetType::User,
        Some(user_id),
        json!({ "role": req.role, "is_active": req.is_active }),
    )
    .await;

    Ok(Json(DataResponse::new(User::from(row))))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == admin.user_id() {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::DeleteUser,
        AuditTargetType::User,
        Some(user_id),
        json!({}),
    )
    .await;

    Ok(NoContent)
}

// ============================================================================
// Products
// ============================================================================

/// GET /api/admin/products
///
/// Every product regardless of status or shop approval.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AdminProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = filter.status.map(|s| s.as_str());
    let search = non_blank(&filter.search);

    let where_clause = r#"
        ($1::text IS NULL OR p.status = $1)
        AND ($2::uuid IS NULL OR p.seller_id = $2)
        AND ($3::text IS NULL OR p.name ILIKE '%' || $3 || '%')
    "#;

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p WHERE {}", where_clause))
            .bind(status)
            .bind(filter.seller_id)
            .bind(search)
            .fetch_one(&state.db)
            .await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "{} WHERE {} ORDER BY p.created_at DESC LIMIT $4 OFFSET $5",
        PRODUCT_SELECT, where_clause
    ))
    .bind(status)
    .bind(filter.seller_id)
    .bind(search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(Paginated::new(products, &pagination, total)))
}

/// PATCH /api/admin/products/:id/status
pub async fn update_product_status(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            status = $2,
            is_featured = COALESCE($3, is_featured),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .bind(req.status.as_str())
    .bind(req.is_featured)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::UpdateProductStatus,
        AuditTargetType::Product,
        Some(product_id),
        json!({ "status": req.status, "is_featured": req.is_featured }),
    )
    .await;

    let product = sqlx::query_as::<_, Product>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
        .bind(product_id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(DataResponse::new(product)))
}

/// DELETE /api/admin/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::DeleteProduct,
        AuditTargetType::Product,
        Some(product_id),
        json!({}),
    )
    .await;

    Ok(NoContent)
}

// ============================================================================
// Locations
// ============================================================================

fn validate_location(req: &LocationRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::default();
    for (field, label, value) in [
        ("name", "Name", &req.name),
        ("city", "City", &req.city),
        ("state", "State", &req.state),
    ] {
        if value.trim().is_empty() {
            errors.add(field, format!("{} is required", label));
        }
    }
    if let Some(pincode) = non_blank(&req.pincode) {
        if !crate::wizard::steps::pincode_regex().is_match(pincode) {
            errors.add("pincode", "Enter a valid 6-digit pincode");
        }
    }
    errors.into_result()?;
    Ok(())
}

/// GET /api/admin/locations
///
/// All locations, including inactive ones.
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let locations = sqlx::query_as::<_, Location>(
        "SELECT id, name, city, state, pincode, is_active FROM locations ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(locations)))
}

/// POST /api/admin/locations
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<LocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_location(&req)?;

    let location = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (name, city, state, pincode, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, city, state, pincode, is_active
        "#,
    )
    .bind(req.name.trim())
    .bind(req.city.trim())
    .bind(req.state.trim())
    .bind(non_blank(&req.pincode))
    .bind(req.is_active)
    .fetch_one(&state.db)
    .await?;

    invalidate(state.cache(), keys::ACTIVE_LOCATIONS).await;
    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::UpdateLocation,
        AuditTargetType::Location,
        Some(location.id),
        json!({ "created": location.name }),
    )
    .await;

    Ok(Created(location))
}

/// PUT /api/admin/locations/:id
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(location_id): Path<Uuid>,
    Json(req): Json<LocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_location(&req)?;

    let location = sqlx::query_as::<_, Location>(
        r#"
        UPDATE locations SET name = $2, city = $3, state = $4, pincode = $5, is_active = $6
        WHERE id = $1
        RETURNING id, name, city, state, pincode, is_active
        "#,
    )
    .bind(location_id)
    .bind(req.name.trim())
    .bind(req.city.trim())
    .bind(req.state.trim())
    .bind(non_blank(&req.pincode))
    .bind(req.is_active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Location not found"))?;

    invalidate(state.cache(), keys::ACTIVE_LOCATIONS).await;
    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::UpdateLocation,
        AuditTargetType::Location,
        Some(location_id),
        json!({ "is_active": location.is_active }),
    )
    .await;

    Ok(Json(DataResponse::new(location)))
}

/// DELETE /api/admin/locations/:id
///
/// Shops in the location keep their data; their location is cleared.
pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(location_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(location_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Location not found"));
    }

    invalidate(state.cache(), keys::ACTIVE_LOCATIONS).await;
    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::UpdateLocation,
        AuditTargetType::Location,
        Some(location_id),
        json!({ "deleted": true }),
    )
    .await;

    Ok(NoContent)
}

// ============================================================================
// Onboarding Configuration
// ============================================================================

fn validate_document_type(req: &DocumentTypeRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::default();
    if req.name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if req.accepted_formats.iter().all(|f| f.trim().is_empty()) {
        errors.add("accepted_formats", "At least one file format is required");
    }
    if !(1..=50).contains(&req.max_size_mb) {
        errors.add("max_size_mb", "Maximum size must be between 1 and 50 MB");
    }
    errors.into_result()?;
    Ok(())
}

fn normalize_formats(formats: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for format in formats {
        let format = format.trim().trim_start_matches('.').to_lowercase();
        if !format.is_empty() && !normalized.contains(&format) {
            normalized.push(format);
        }
    }
    normalized
}

async fn config_changed(state: &AppState, admin_id: Uuid, details: serde_json::Value) {
    invalidate(state.cache(), keys::ONBOARDING_CONFIG).await;
    log_admin_action(
        &state.db,
        admin_id,
        AdminAction::UpdateOnboardingConfig,
        AuditTargetType::OnboardingConfig,
        None,
        details,
    )
    .await;
}

/// GET /api/admin/onboarding-config
pub async fn get_onboarding_config(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let config = fetch_onboarding_config(&state.db).await?;
    Ok(Json(DataResponse::new(config)))
}

/// PUT /api/admin/onboarding-config
pub async fn update_onboarding_config(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<UpdateOnboardingConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query(
        r#"
        INSERT INTO onboarding_config (id, allow_skipping, updated_at)
        VALUES (TRUE, $1, NOW())
        ON CONFLICT (id) DO UPDATE SET allow_skipping = EXCLUDED.allow_skipping, updated_at = NOW()
        "#,
    )
    .bind(req.allow_skipping)
    .execute(&state.db)
    .await?;

    config_changed(&state, admin.user_id(), json!({ "allow_skipping": req.allow_skipping })).await;

    let config = fetch_onboarding_config(&state.db).await?;
    Ok(Json(DataResponse::new(config)))
}

/// PUT /api/admin/onboarding-config/steps/:id
pub async fn update_onboarding_step(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(step_id): Path<Uuid>,
    Json(req): Json<UpdateOnboardingStepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        let mut errors = ValidationErrors::default();
        errors.add("title", "Title cannot be empty");
        return Err(errors.into());
    }

    let step = sqlx::query_as::<_, OnboardingStep>(
        r#"
        UPDATE onboarding_steps SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            position = COALESCE($4, position),
            is_required = COALESCE($5, is_required),
            is_active = COALESCE($6, is_active)
        WHERE id = $1
        RETURNING id, key, title, description, position, is_required, is_active
        "#,
    )
    .bind(step_id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(req.position)
    .bind(req.is_required)
    .bind(req.is_active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Onboarding step not found"))?;

    config_changed(&state, admin.user_id(), json!({ "step": step.key })).await;

    Ok(Json(DataResponse::new(step)))
}

/// POST /api/admin/onboarding-config/document-types
pub async fn create_document_type(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<DocumentTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_document_type(&req)?;

    let doc_type = sqlx::query_as::<_, DocumentType>(
        r#"
        INSERT INTO document_types
            (name, description, is_required, is_active, accepted_formats, max_size_mb)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, description, is_required, is_active, accepted_formats, max_size_mb
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.is_required)
    .bind(req.is_active)
    .bind(normalize_formats(&req.accepted_formats))
    .bind(req.max_size_mb)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("A document type with this name exists".to_string()),
        other => other,
    })?;

    config_changed(&state, admin.user_id(), json!({ "document_type": doc_type.name })).await;

    Ok(Created(doc_type))
}

/// PUT /api/admin/onboarding-config/document-types/:id
pub async fn update_document_type(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(type_id): Path<Uuid>,
    Json(req): Json<DocumentTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_document_type(&req)?;

    let doc_type = sqlx::query_as::<_, DocumentType>(
        r#"
        UPDATE document_types SET
            name = $2, description = $3, is_required = $4, is_active = $5,
            accepted_formats = $6, max_size_mb = $7
        WHERE id = $1
        RETURNING id, name, description, is_required, is_active, accepted_formats, max_size_mb
        "#,
    )
    .bind(type_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.is_required)
    .bind(req.is_active)
    .bind(normalize_formats(&req.accepted_formats))
    .bind(req.max_size_mb)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("A document type with this name exists".to_string()),
        other => other,
    })?
    .ok_or_else(|| ApiError::not_found("Document type not found"))?;

    config_changed(&state, admin.user_id(), json!({ "document_type": doc_type.name })).await;

    Ok(Json(DataResponse::new(doc_type)))
}

/// DELETE /api/admin/onboarding-config/document-types/:id
pub async fn delete_document_type(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(type_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM document_types WHERE id = $1")
        .bind(type_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Document type not found"));
    }

    config_changed(&state, admin.user_id(), json!({ "deleted_document_type": type_id })).await;

    Ok(NoContent)
}

// ============================================================================
// Seller Review
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SellerApplicationRow {
    #[sqlx(flatten)]
    seller: SellerRow,
    owner_name: String,
    owner_email: String,
}

/// GET /api/admin/sellers
///
/// Seller applications, submitted ones first by default.
pub async fn list_sellers(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AdminSellerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = filter
        .status
        .map(|s| OnboardingStatus::from(s).as_str().to_string());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sellers WHERE ($1::text IS NULL OR onboarding_status = $1)",
    )
    .bind(&status)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, SellerApplicationRow>(&format!(
        r#"
        SELECT {}, u.name AS owner_name, u.email AS owner_email
        FROM sellers s
        JOIN users u ON u.id = s.user_id
        WHERE ($1::text IS NULL OR s.onboarding_status = $1)
        ORDER BY (s.onboarding_status = 'submitted') DESC, s.updated_at DESC
        LIMIT $2 OFFSET $3
        "#,
        SELLER_COLUMNS
    ))
    .bind(&status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let seller_ids: Vec<Uuid> = rows.iter().map(|r| r.seller.id).collect();
    let documents = sqlx::query_as::<_, SellerDocument>(
        r#"
        SELECT id, seller_id, document_type_id, file_url, status, created_at
        FROM seller_documents
        WHERE seller_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&seller_ids)
    .fetch_all(&state.db)
    .await?;

    let mut by_seller: HashMap<Uuid, Vec<SellerDocument>> = HashMap::new();
    for doc in documents {
        by_seller.entry(doc.seller_id).or_default().push(doc);
    }

    let applications: Vec<SellerApplication> = rows
        .into_iter()
        .map(|row| SellerApplication {
            documents: by_seller.remove(&row.seller.id).unwrap_or_default(),
            seller: Seller::from(row.seller),
            owner_name: row.owner_name,
            owner_email: row.owner_email,
        })
        .collect();

    Ok(Json(Paginated::new(applications, &pagination, total)))
}

/// Move a submitted application to its final state.
async fn decide_application(
    state: &AppState,
    seller_id: Uuid,
    decision: OnboardingStatus,
    reason: Option<&str>,
) -> Result<Seller, ApiError> {
    let mut tx = state.db.begin().await?;

    let current: String =
        sqlx::query_scalar("SELECT onboarding_status FROM sellers WHERE id = $1 FOR UPDATE")
            .bind(seller_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Seller not found"))?;

    if OnboardingStatus::from(current) != OnboardingStatus::Submitted {
        return Err(ApiError::bad_request(
            "Only submitted applications can be reviewed",
        ));
    }

    let row = sqlx::query_as::<_, SellerRow>(&format!(
        r#"
        UPDATE sellers s SET onboarding_status = $2, rejection_reason = $3, updated_at = NOW()
        WHERE s.id = $1
        RETURNING {}
        "#,
        SELLER_COLUMNS
    ))
    .bind(seller_id)
    .bind(decision.as_str())
    .bind(reason)
    .fetch_one(&mut *tx)
    .await?;

    let document_status = if decision == OnboardingStatus::Approved {
        "verified"
    } else {
        "rejected"
    };
    sqlx::query("UPDATE seller_documents SET status = $2 WHERE seller_id = $1 AND status = 'pending'")
        .bind(seller_id)
        .bind(document_status)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Seller::from(row))
}

/// POST /api/admin/sellers/:id/approve
pub async fn approve_seller(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(seller_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = decide_application(&state, seller_id, OnboardingStatus::Approved, None).await?;

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::ApproveSeller,
        AuditTargetType::Seller,
        Some(seller_id),
        json!({ "shop_name": seller.shop_name }),
    )
    .await;

    Ok(Json(DataResponse::new(seller)))
}

/// POST /api/admin/sellers/:id/reject
pub async fn reject_seller(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Path(seller_id): Path<Uuid>,
    Json(req): Json<RejectSellerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        let mut errors = ValidationErrors::default();
        errors.add("reason", "A rejection reason is required");
        return Err(errors.into());
    }

    let seller =
        decide_application(&state, seller_id, OnboardingStatus::Rejected, Some(reason)).await?;

    log_admin_action(
        &state.db,
        admin.user_id(),
        AdminAction::RejectSeller,
        AuditTargetType::Seller,
        Some(seller_id),
        json!({ "reason": reason }),
    )
    .await;

    Ok(Json(DataResponse::new(seller)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(name: &str, pincode: Option<&str>) -> LocationRequest {
        LocationRequest {
            name: name.into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: pincode.map(Into::into),
            is_active: true,
        }
    }

    fn field_errors(result: Result<(), ApiError>) -> ValidationErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn location_requires_name_and_valid_pincode() {
        assert!(validate_location(&location("Koregaon Park", Some("411001"))).is_ok());
        assert!(validate_location(&location("Koregaon Park", None)).is_ok());

        let errors = field_errors(validate_location(&location(" ", Some("41"))));
        assert!(errors.contains("name"));
        assert!(errors.contains("pincode"));
    }

    #[test]
    fn document_type_limits() {
        let req: DocumentTypeRequest =
            serde_json::from_value(json!({"name": "", "accepted_formats": [" "], "max_size_mb": 0}))
                .unwrap();
        let errors = field_errors(validate_document_type(&req));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn formats_are_normalized() {
        let formats = vec![".PDF".to_string(), "pdf".to_string(), " jpg ".to_string(), "".to_string()];
        assert_eq!(normalize_formats(&formats), vec!["pdf", "jpg"]);
    }
}
