use axum::{http::HeaderValue, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::JwtKeys;
use crate::config::Settings;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{AnalyticsForwarder, RedisCache};

/// JSON bodies larger than this are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Settings,
    pub jwt: JwtKeys,
    /// `None` when Redis was unreachable at startup; reads go to the database.
    pub cache: Option<RedisCache>,
    /// `None` unless both GA settings are configured.
    pub analytics: Option<AnalyticsForwarder>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        settings: Settings,
        cache: Option<RedisCache>,
        analytics: Option<AnalyticsForwarder>,
    ) -> Arc<Self> {
        let jwt = JwtKeys::new(&settings.jwt_secret, settings.jwt_ttl_hours);
        Arc::new(Self {
            db,
            settings,
            jwt,
            cache,
            analytics,
        })
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Build trace layer (use DEBUG for spans to reduce overhead at INFO level)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}

/// State backed by a pool that never connects; for tests that must not
/// reach the database.
#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    let settings = Settings::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret-that-is-long-enough-for-hs256".to_string()),
        "DATABASE_URL" => Some("postgres://localhost/emall_test".to_string()),
        _ => None,
    })
    .expect("test settings");

    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&settings.database_url)
        .expect("lazy pool");

    AppState::new(db, settings, None, None)
}
