//! Saved delivery addresses

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireActive;
use crate::domain::addresses::{address_rules, Address, AddressRequest};
use crate::error::ApiError;

const ADDRESS_COLUMNS: &str =
    "id, user_id, label, line1, line2, city, state, pincode, phone, is_default, created_at";

fn validate(req: &AddressRequest) -> Result<(), ApiError> {
    let form = serde_json::to_value(req).map_err(anyhow::Error::from)?;
    address_rules().validate(&form)?;
    Ok(())
}

/// Only one address per user is the default.
async fn clear_default(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    sqlx::query(
        "UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(user_id)
    .bind(except)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// GET /api/addresses
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
) -> Result<impl IntoResponse, ApiError> {
    let addresses = sqlx::query_as::<_, Address>(&format!(
        "SELECT {} FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at",
        ADDRESS_COLUMNS
    ))
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DataResponse::new(addresses)))
}

/// POST /api/addresses
///
/// The first saved address becomes the default.
pub async fn create_address(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Json(req): Json<AddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let mut tx = state.db.begin().await?;

    let has_any: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM addresses WHERE user_id = $1)")
            .bind(auth.user_id)
            .fetch_one(&mut *tx)
            .await?;
    let is_default = req.is_default || !has_any;
    if is_default {
        clear_default(&mut tx, auth.user_id, None).await?;
    }

    let address = sqlx::query_as::<_, Address>(&format!(
        r#"
        INSERT INTO addresses (user_id, label, line1, line2, city, state, pincode, phone, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        ADDRESS_COLUMNS
    ))
    .bind(auth.user_id)
    .bind(&req.label)
    .bind(req.line1.trim())
    .bind(&req.line2)
    .bind(req.city.trim())
    .bind(req.state.trim())
    .bind(req.pincode.trim())
    .bind(req.phone.trim())
    .bind(is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Created(address))
}

/// PUT /api/addresses/:id
pub async fn update_address(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(address_id): Path<Uuid>,
    Json(req): Json<AddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let mut tx = state.db.begin().await?;

    if req.is_default {
        clear_default(&mut tx, auth.user_id, Some(address_id)).await?;
    }

    let address = sqlx::query_as::<_, Address>(&format!(
        r#"
        UPDATE addresses SET
            label = $3, line1 = $4, line2 = $5, city = $6, state = $7,
            pincode = $8, phone = $9, is_default = $10 OR is_default
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        ADDRESS_COLUMNS
    ))
    .bind(address_id)
    .bind(auth.user_id)
    .bind(&req.label)
    .bind(req.line1.trim())
    .bind(&req.line2)
    .bind(req.city.trim())
    .bind(req.state.trim())
    .bind(req.pincode.trim())
    .bind(req.phone.trim())
    .bind(req.is_default)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Address not found"))?;

    tx.commit().await?;

    Ok(Json(DataResponse::new(address)))
}

/// DELETE /api/addresses/:id
pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
    Path(address_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiError::not_found("Address not found"));
    }

    Ok(NoContent)
}
