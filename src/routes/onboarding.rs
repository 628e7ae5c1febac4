//! Seller onboarding and shop profile routes
//!
//! Onboarding is a server-side [`Wizard`] rebuilt on every request from the
//! admin configuration and the seller's persisted completed/skipped steps.
//! Step payloads are written straight into the shop row and its documents.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireSeller;
use crate::domain::onboarding::{DocumentType, OnboardingConfig, OnboardingProgress, OnboardingStep};
use crate::domain::sellers::{
    AddDocumentRequest, BasicDetailsForm, DocumentsForm, OnboardingStatus, Seller, SellerDocument,
    SellerRow, ShopTimingForm, UpdateSellerProfileRequest,
};
use crate::error::ApiError;
use crate::services::cache::{get_or_load, keys};
use crate::validation::{FieldRules, RuleSet, ValidationErrors};
use crate::wizard::steps::{
    default_onboarding_steps, phone_regex, OnboardingRules, BASIC_DETAILS, DOCUMENT_VERIFICATION,
    SHOP_TIMING,
};
use crate::wizard::{StepRules, Wizard};

const SELLER_COLUMNS: &str = r#"
    id, user_id, shop_name, description, category, address, city, state, pincode, phone,
    gst_number, opening_time, closing_time, working_days, logo_url, banner_url, location_id,
    onboarding_status, completed_steps, skipped_steps, rejection_reason, created_at, updated_at
"#;

// ============================================================================
// Shared helpers
// ============================================================================

/// Steps and document types straight from the database.
pub(crate) async fn fetch_onboarding_config(db: &PgPool) -> Result<OnboardingConfig, ApiError> {
    let (allow_skipping, updated_at): (bool, chrono::DateTime<chrono::Utc>) =
        sqlx::query_as("SELECT allow_skipping, updated_at FROM onboarding_config WHERE id")
            .fetch_optional(db)
            .await?
            .unwrap_or((false, chrono::Utc::now()));

    let steps = sqlx::query_as::<_, OnboardingStep>(
        r#"
        SELECT id, key, title, description, position, is_required, is_active
        FROM onboarding_steps
        ORDER BY position
        "#,
    )
    .fetch_all(db)
    .await?;

    let document_types = sqlx::query_as::<_, DocumentType>(
        r#"
        SELECT id, name, description, is_required, is_active, accepted_formats, max_size_mb
        FROM document_types
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(OnboardingConfig {
        allow_skipping,
        steps,
        document_types,
        updated_at: Some(updated_at),
    })
}

/// The onboarding configuration, via the cache when one is available.
pub(crate) async fn load_onboarding_config(state: &AppState) -> Result<OnboardingConfig, ApiError> {
    get_or_load(state.cache(), keys::ONBOARDING_CONFIG, || {
        fetch_onboarding_config(&state.db)
    })
    .await
}

/// The caller's shop row, created on first access.
pub(crate) async fn load_seller(db: &PgPool, user_id: Uuid) -> Result<SellerRow, ApiError> {
    sqlx::query("INSERT INTO sellers (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;

    let row = sqlx::query_as::<_, SellerRow>(&format!(
        "SELECT {} FROM sellers WHERE user_id = $1",
        SELLER_COLUMNS
    ))
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

fn build_wizard(
    config: &OnboardingConfig,
    seller: &SellerRow,
) -> Result<Wizard<OnboardingRules>, ApiError> {
    let mut steps = config.step_configs();
    if steps.is_empty() {
        steps = default_onboarding_steps();
    }

    let wizard = Wizard::resume(
        steps,
        config.allow_skipping,
        OnboardingRules::new(config.required_document_types()),
        seller.completed_steps.clone(),
        seller.skipped_steps.clone(),
    )?;
    Ok(wizard)
}

fn progress_of(
    wizard: &Wizard<OnboardingRules>,
    status: OnboardingStatus,
    rejection_reason: Option<String>,
) -> OnboardingProgress {
    OnboardingProgress {
        status,
        current_step: wizard.current_step().map(|s| s.key.clone()),
        completed_steps: wizard.completed_steps().map(str::to_string).collect(),
        skipped_steps: wizard.skipped_steps().map(str::to_string).collect(),
        missing_required: wizard
            .missing_required()
            .into_iter()
            .map(|s| s.key.clone())
            .collect(),
        progress_percent: wizard.progress_percent(),
        can_skip: wizard.can_skip(),
        rejection_reason,
    }
}

fn ensure_editable(status: OnboardingStatus) -> Result<(), ApiError> {
    if !status.is_editable() {
        return Err(ApiError::bad_request(format!(
            "Onboarding is {} and can no longer be edited",
            status
        )));
    }
    Ok(())
}

/// Persist wizard position and move a fresh or rejected seller to in-progress.
async fn save_progress(
    conn: &mut PgConnection,
    seller_id: Uuid,
    wizard: &Wizard<OnboardingRules>,
) -> Result<(), ApiError> {
    let completed: Vec<String> = wizard.completed_steps().map(str::to_string).collect();
    let skipped: Vec<String> = wizard.skipped_steps().map(str::to_string).collect();

    sqlx::query(
        r#"
        UPDATE sellers SET
            completed_steps = $2,
            skipped_steps = $3,
            onboarding_status = 'in_progress',
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(seller_id)
    .bind(&completed)
    .bind(&skipped)
    .execute(conn)
    .await?;
    Ok(())
}

fn parse_form<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::bad_request(format!("Malformed step data: {}", e)))
}

/// Insert or replace one document, checking its type and format.
async fn upsert_document(
    conn: &mut PgConnection,
    seller_id: Uuid,
    doc: &AddDocumentRequest,
    document_types: &[DocumentType],
) -> Result<SellerDocument, ApiError> {
    let doc_type = document_types
        .iter()
        .find(|t| t.id == doc.document_type_id && t.is_active)
        .ok_or_else(|| ApiError::bad_request("Unknown document type"))?;

    if !doc_type.accepts(&doc.file_url) {
        let mut errors = ValidationErrors::default();
        errors.add(
            "file_url",
            format!(
                "{} must be one of: {}",
                doc_type.name,
                doc_type.accepted_formats.join(", ")
            ),
        );
        return Err(errors.into());
    }

    let document = sqlx::query_as::<_, SellerDocument>(
        r#"
        INSERT INTO seller_documents (seller_id, document_type_id, file_url)
        VALUES ($1, $2, $3)
        ON CONFLICT (seller_id, document_type_id) DO UPDATE SET
            file_url = EXCLUDED.file_url,
            status = 'pending',
            created_at = NOW()
        RETURNING id, seller_id, document_type_id, file_url, status, created_at
        "#,
    )
    .bind(seller_id)
    .bind(doc.document_type_id)
    .bind(doc.file_url.trim())
    .fetch_one(conn)
    .await?;
    Ok(document)
}

/// Write a validated step payload into the shop row. Steps added by admins
/// beyond the built-in three only record completion.
async fn apply_step(
    conn: &mut PgConnection,
    seller_id: Uuid,
    key: &str,
    data: Value,
    config: &OnboardingConfig,
) -> Result<(), ApiError> {
    match key {
        BASIC_DETAILS => {
            let form: BasicDetailsForm = parse_form(data)?;
            sqlx::query(
                r#"
                UPDATE sellers SET
                    shop_name = $2, description = $3, category = $4, phone = $5,
                    address = $6, city = $7, state = $8, pincode = $9,
                    gst_number = $10, location_id = $11, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(seller_id)
            .bind(form.shop_name.trim())
            .bind(&form.description)
            .bind(&form.category)
            .bind(form.phone.trim())
            .bind(form.address.trim())
            .bind(form.city.trim())
            .bind(form.state.trim())
            .bind(form.pincode.trim())
            .bind(form.gst_number.as_deref().map(str::to_uppercase))
            .bind(form.location_id)
            .execute(conn)
            .await?;
        }
        SHOP_TIMING => {
            let form: ShopTimingForm = parse_form(data)?;
            let days: Vec<String> = form.working_days.iter().map(|d| d.to_lowercase()).collect();
            sqlx::query(
                r#"
                UPDATE sellers SET
                    opening_time = $2, closing_time = $3, working_days = $4, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(seller_id)
            .bind(&form.opening_time)
            .bind(&form.closing_time)
            .bind(&days)
            .execute(conn)
            .await?;
        }
        DOCUMENT_VERIFICATION => {
            let form: DocumentsForm = parse_form(data)?;
            for doc in &form.documents {
                upsert_document(&mut *conn, seller_id, doc, &config.document_types).await?;
            }
        }
        _ => {}
    }
    Ok(())
}

// ============================================================================
// Onboarding
// ============================================================================

/// GET /api/seller/onboarding/config
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    _seller: RequireSeller,
) -> Result<impl IntoResponse, ApiError> {
    let config = load_onboarding_config(&state).await?;
    Ok(Json(DataResponse::new(config)))
}

/// GET /api/seller/onboarding
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
) -> Result<impl IntoResponse, ApiError> {
    let config = load_onboarding_config(&state).await?;
    let row = load_seller(&state.db, seller.user_id()).await?;
    let wizard = build_wizard(&config, &row)?;

    let progress = progress_of(
        &wizard,
        row.onboarding_status.clone().into(),
        row.rejection_reason.clone(),
    );
    Ok(Json(DataResponse::new(progress)))
}

/// PUT /api/seller/onboarding/steps/:key
///
/// Validate and save one step. The current step advances the wizard;
/// earlier steps may be re-submitted to correct them.
pub async fn submit_step(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Path(step_key): Path<String>,
    Json(data): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let config = load_onboarding_config(&state).await?;
    let row = load_seller(&state.db, seller.user_id()).await?;
    let status = OnboardingStatus::from(row.onboarding_status.clone());
    ensure_editable(status)?;

    let mut wizard = build_wizard(&config, &row)?;
    wizard.submit_step(&step_key, data.clone())?;

    let mut tx = state.db.begin().await?;
    apply_step(&mut *tx, row.id, &step_key, data, &config).await?;
    save_progress(&mut *tx, row.id, &wizard).await?;
    tx.commit().await?;

    tracing::info!(user_id = %seller.user_id(), step = %step_key, "Onboarding step saved");

    let progress = progress_of(&wizard, OnboardingStatus::InProgress, row.rejection_reason);
    Ok(Json(DataResponse::new(progress)))
}

/// POST /api/seller/onboarding/steps/:key/skip
pub async fn skip_step(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Path(step_key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let config = load_onboarding_config(&state).await?;
    let row = load_seller(&state.db, seller.user_id()).await?;
    ensure_editable(OnboardingStatus::from(row.onboarding_status.clone()))?;

    let mut wizard = build_wizard(&config, &row)?;
    match wizard.current_step() {
        Some(current) if current.key == step_key => {}
        Some(_) => {
            return Err(ApiError::bad_request("Only the current step can be skipped"));
        }
        None => return Err(ApiError::bad_request("Onboarding steps are already complete")),
    }
    wizard.skip()?;

    let mut conn = state.db.acquire().await?;
    save_progress(&mut *conn, row.id, &wizard).await?;

    tracing::info!(user_id = %seller.user_id(), step = %step_key, "Onboarding step skipped");

    let progress = progress_of(&wizard, OnboardingStatus::InProgress, row.rejection_reason);
    Ok(Json(DataResponse::new(progress)))
}

/// POST /api/seller/onboarding/submit
///
/// Hand the application to admins. Every required step must be complete and
/// every required document uploaded.
pub async fn submit_onboarding(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
) -> Result<impl IntoResponse, ApiError> {
    let config = load_onboarding_config(&state).await?;
    let row = load_seller(&state.db, seller.user_id()).await?;
    ensure_editable(OnboardingStatus::from(row.onboarding_status.clone()))?;

    let wizard = build_wizard(&config, &row)?;

    let mut errors = ValidationErrors::default();
    for step in wizard.missing_required() {
        errors.add(step.key.clone(), format!("{} is required", step.title));
    }

    if wizard.steps().iter().any(|s| s.key == DOCUMENT_VERIFICATION) {
        let missing_docs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT dt.name
            FROM document_types dt
            WHERE dt.is_active AND dt.is_required
              AND NOT EXISTS (
                  SELECT 1 FROM seller_documents sd
                  WHERE sd.seller_id = $1 AND sd.document_type_id = dt.id
              )
            ORDER BY dt.name
            "#,
        )
        .bind(row.id)
        .fetch_all(&state.db)
        .await?;

        for name in missing_docs {
            errors.add("documents", format!("{} is required", name));
        }
    }
    errors.into_result()?;

    sqlx::query(
        r#"
        UPDATE sellers SET
            onboarding_status = 'submitted', rejection_reason = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(row.id)
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = %seller.user_id(), seller_id = %row.id, "Onboarding submitted for review");

    Ok(Json(DataResponse::new(progress_of(
        &wizard,
        OnboardingStatus::Submitted,
        None,
    ))))
}

/// POST /api/seller/documents
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Json(req): Json<AddDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.file_url.trim().is_empty() {
        let mut errors = ValidationErrors::default();
        errors.add("file_url", "File is required");
        return Err(errors.into());
    }

    let config = load_onboarding_config(&state).await?;
    let row = load_seller(&state.db, seller.user_id()).await?;
    ensure_editable(OnboardingStatus::from(row.onboarding_status.clone()))?;

    let mut conn = state.db.acquire().await?;
    let document = upsert_document(&mut *conn, row.id, &req, &config.document_types).await?;

    Ok(Created(document))
}

// ============================================================================
// Profile
// ============================================================================

fn profile_rules() -> RuleSet {
    RuleSet::new()
        .field(
            FieldRules::new("shop_name", "Shop name")
                .min_length(3)
                .max_length(100),
        )
        .field(
            FieldRules::new("phone", "Phone number")
                .pattern(phone_regex(), "Enter a valid 10-digit mobile number"),
        )
        .field(FieldRules::new("description", "Description").max_length(2000))
}

/// GET /api/seller/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_seller(&state.db, seller.user_id()).await?;
    Ok(Json(DataResponse::new(Seller::from(row))))
}

/// PUT /api/seller/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    seller: RequireSeller,
    Json(req): Json<UpdateSellerProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = serde_json::to_value(&req).map_err(anyhow::Error::from)?;
    profile_rules().validate(&form)?;

    let row = load_seller(&state.db, seller.user_id()).await?;

    // Timing edits are checked as a whole against the stored values
    if req.opening_time.is_some() || req.closing_time.is_some() || req.working_days.is_some() {
        let timing = serde_json::json!({
            "opening_time": req.opening_time.as_ref().or(row.opening_time.as_ref()),
            "closing_time": req.closing_time.as_ref().or(row.closing_time.as_ref()),
            "working_days": req.working_days.as_ref().unwrap_or(&row.working_days),
        });
        OnboardingRules::default()
            .rules_for(SHOP_TIMING)
            .validate(&timing)?;
    }

    let updated = sqlx::query_as::<_, SellerRow>(&format!(
        r#"
        UPDATE sellers SET
            shop_name = COALESCE($2, shop_name),
            description = COALESCE($3, description),
            phone = COALESCE($4, phone),
            logo_url = COALESCE($5, logo_url),
            banner_url = COALESCE($6, banner_url),
            opening_time = COALESCE($7, opening_time),
            closing_time = COALESCE($8, closing_time),
            working_days = COALESCE($9, working_days),
            location_id = COALESCE($10, location_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        SELLER_COLUMNS
    ))
    .bind(row.id)
    .bind(&req.shop_name)
    .bind(&req.description)
    .bind(&req.phone)
    .bind(&req.logo_url)
    .bind(&req.banner_url)
    .bind(&req.opening_time)
    .bind(&req.closing_time)
    .bind(&req.working_days)
    .bind(req.location_id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %seller.user_id(), "Seller profile updated");

    Ok(Json(DataResponse::new(Seller::from(updated))))
}
