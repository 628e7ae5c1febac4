use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AuthContext;
use crate::app::AppState;
use crate::domain::users::Role;
use crate::error::ErrorResponse;

/// Extractor that requires authentication
/// Use this in route handlers to require a valid JWT
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken(String),
    WrongRole(Role),
    Inactive,
    Database(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing authorization token")
            }
            AuthError::InvalidFormat => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid authorization format")
            }
            AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid or expired token")
            }
            AuthError::WrongRole(Role::Admin) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Admin privileges required")
            }
            AuthError::WrongRole(Role::Seller) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Seller account required")
            }
            AuthError::WrongRole(Role::Customer) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Customer account required")
            }
            AuthError::Inactive => (StatusCode::FORBIDDEN, "FORBIDDEN", "Account is deactivated"),
            AuthError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred",
            ),
        };

        if let AuthError::Database(e) = &self {
            tracing::error!(error = %e, "Role lookup failed");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AuthError::MissingToken
                    } else {
                        AuthError::InvalidFormat
                    }
                })?;

        let token = bearer.token();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = state.jwt.verify(token).map_err(|e| {
            tracing::warn!(error = %e, "JWT verification failed");
            AuthError::InvalidToken(e.to_string())
        })?;

        let context = AuthContext::from_claims_with_token(&claims, token).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build auth context");
            AuthError::InvalidToken(e.to_string())
        })?;

        Ok(RequireAuth(context))
    }
}

/// Decide whether the stored account may proceed. `role` is the role the
/// route requires, if any.
fn check_account(row: Option<(String, bool)>, role: Option<Role>) -> Result<(), AuthError> {
    match (row, role) {
        (None, _) => Err(AuthError::InvalidToken("user no longer exists".to_string())),
        (Some((_, false)), _) => Err(AuthError::Inactive),
        (Some(_), None) => Ok(()),
        (Some((current, true)), Some(role)) if current == role.as_str() => Ok(()),
        (Some(_), Some(role)) => Err(AuthError::WrongRole(role)),
    }
}

/// Authenticate, then confirm against the database that the account still
/// exists, is active and, when `role` is given, still holds it.
async fn require_account(
    parts: &mut Parts,
    state: &Arc<AppState>,
    role: Option<Role>,
) -> Result<RequireAuth, AuthError> {
    let auth = RequireAuth::from_request_parts(parts, state).await?;

    if let Some(role) = role {
        if auth.role != role {
            tracing::warn!(user_id = %auth.user_id, required = %role, "Role check failed");
            return Err(AuthError::WrongRole(role));
        }
    }

    let row: Option<(String, bool)> =
        sqlx::query_as("SELECT role, is_active FROM users WHERE id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

    check_account(row, role).map_err(|e| {
        if matches!(e, AuthError::Inactive) {
            tracing::warn!(user_id = %auth.user_id, "Rejected request from deactivated account");
        }
        e
    })?;

    Ok(auth)
}

/// Extractor that requires a valid JWT for an account that still exists and
/// has not been deactivated. Any role.
#[derive(Debug, Clone)]
pub struct RequireActive(pub RequireAuth);

impl std::ops::Deref for RequireActive {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireActive {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        require_account(parts, state, None).await.map(RequireActive)
    }
}

/// Extractor that requires an active admin account.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub RequireAuth);

impl RequireAdmin {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        require_account(parts, state, Some(Role::Admin)).await.map(RequireAdmin)
    }
}

/// Extractor that requires an active seller account.
#[derive(Debug, Clone)]
pub struct RequireSeller(pub RequireAuth);

impl RequireSeller {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireSeller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        require_account(parts, state, Some(Role::Seller)).await.map(RequireSeller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_state;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(auth: RequireAuth) -> String {
        format!("{}:{}", auth.email, auth.role)
    }

    async fn admin_only(_admin: RequireAdmin) -> &'static str {
        "ok"
    }

    fn router() -> (Router, Arc<AppState>) {
        let state = test_state();
        let router = Router::new()
            .route("/whoami", get(whoami))
            .route("/admin", get(admin_only))
            .with_state(state.clone());
        (router, state)
    }

    async fn status_for(router: Router, uri: &str, auth: Option<&str>) -> StatusCode {
        let mut request = Request::builder().uri(uri);
        if let Some(value) = auth {
            request = request.header("Authorization", value);
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (router, _) = router();
        assert_eq!(status_for(router, "/whoami", None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let (router, _) = router();
        let status = status_for(router, "/whoami", Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let (router, _) = router();
        let status = status_for(router, "/whoami", Some("Bearer not.a.jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_passes() {
        let (router, state) = router();
        let token = state
            .jwt
            .issue(Uuid::new_v4(), "shopper@emall.world", Role::Customer, None)
            .unwrap();

        let status = status_for(router, "/whoami", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn customer_token_is_forbidden_on_admin_routes() {
        let (router, state) = router();
        let token = state
            .jwt
            .issue(Uuid::new_v4(), "shopper@emall.world", Role::Customer, None)
            .unwrap();

        let status = status_for(router, "/admin", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    fn row(role: &str, active: bool) -> Option<(String, bool)> {
        Some((role.to_string(), active))
    }

    #[test]
    fn deactivated_account_is_forbidden_for_any_route() {
        for required in [None, Some(Role::Seller), Some(Role::Admin)] {
            let role = required.map(|r| r.as_str()).unwrap_or("customer");
            let err = check_account(row(role, false), required).unwrap_err();
            assert!(matches!(err, AuthError::Inactive));
            assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn active_account_passes_its_own_role_only() {
        assert!(check_account(row("customer", true), None).is_ok());
        assert!(check_account(row("seller", true), Some(Role::Seller)).is_ok());
        assert!(matches!(
            check_account(row("customer", true), Some(Role::Seller)),
            Err(AuthError::WrongRole(Role::Seller))
        ));
    }

    #[test]
    fn deleted_account_is_unauthorized() {
        let err = check_account(None, None).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
