//! Authentication routes
//!
//! Accounts live in the `users` table; sessions are stateless HS256 tokens.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{RequireActive, RequireAuth};
use crate::domain::users::{
    login_rules, registration_rules, AuthResponse, LoginRequest, RegisterRequest, Role, User,
    UserRow,
};
use crate::error::ApiError;

const USER_COLUMNS: &str =
    "id, name, email, phone, password_hash, role, is_active, created_at, updated_at";

/// Attach the seller's onboarding status so the client can route them.
async fn with_onboarding_status(state: &AppState, mut user: User) -> Result<User, ApiError> {
    if user.role == Role::Seller {
        user.onboarding_status =
            sqlx::query_scalar("SELECT onboarding_status FROM sellers WHERE user_id = $1")
                .bind(user.id)
                .fetch_optional(&state.db)
                .await?;
    }
    Ok(user)
}

fn issue_token(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = state
        .jwt
        .issue(user.id, &user.email, user.role, Some(&user.name))?;
    Ok(AuthResponse {
        token,
        expires_in: state.jwt.ttl_seconds(),
        user,
    })
}

/// POST /api/auth/register
///
/// Create a customer or seller account. Sellers also get an empty shop row
/// so onboarding can start immediately.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = serde_json::to_value(&req).map_err(anyhow::Error::from)?;
    registration_rules().validate(&form)?;

    let email = req.email.trim().to_lowercase();
    let role = Role::from(req.role);
    let password_hash = hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (name, email, phone, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(req.name.trim())
    .bind(&email)
    .bind(&req.phone)
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Email is already registered".to_string()),
        other => other,
    })?;

    if role == Role::Seller {
        sqlx::query("INSERT INTO sellers (user_id, phone) VALUES ($1, $2)")
            .bind(row.id)
            .bind(&req.phone)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(user_id = %row.id, role = %role, "User registered");

    let user = with_onboarding_status(&state, User::from(row)).await?;
    Ok(Created(issue_token(&state, user)?))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = serde_json::to_value(&req).map_err(anyhow::Error::from)?;
    login_rules().validate(&form)?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(req.email.trim().to_lowercase())
    .fetch_optional(&state.db)
    .await?;

    // Same message for unknown email and wrong password
    let row = match row {
        Some(row) if verify_password(&req.password, &row.password_hash) => row,
        _ => return Err(ApiError::Unauthorized("Invalid email or password".to_string())),
    };

    if !row.is_active {
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    tracing::info!(user_id = %row.id, "User logged in");

    let user = with_onboarding_status(&state, User::from(row)).await?;
    Ok(Json(DataResponse::new(issue_token(&state, user)?)))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: RequireActive,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let user = with_onboarding_status(&state, User::from(row)).await?;
    Ok(Json(DataResponse::new(user)))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client drops its copy.
pub async fn logout(auth: RequireAuth) -> impl IntoResponse {
    tracing::info!(user_id = %auth.user_id, "User logged out");
    Json(MessageResponse::new("Logged out"))
}
