pub mod addresses;
pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod locations;
pub mod onboarding;
pub mod reviews;
pub mod seller_products;
pub mod stores;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/products", get(catalog::list_products))
        .route("/api/products/:id", get(catalog::get_product))
        .route(
            "/api/products/:id/technical-details",
            get(catalog::get_technical_details),
        )
        .route(
            "/api/products/:id/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/brands", get(catalog::list_brands))
        .route("/api/deals", get(catalog::list_deals))
        .route("/api/stores", get(stores::list_stores))
        .route("/api/stores/:id", get(stores::get_store))
        .route("/api/stores/:id/products", get(stores::list_store_products))
        .route("/api/locations", get(locations::list_locations))
        .route("/api/ga-proxy/ga-event", post(analytics::track_event))
        // Authenticated routes
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/reviews/:id", delete(reviews::delete_review))
        .route("/api/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/:product_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/api/addresses",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/api/addresses/:id",
            put(addresses::update_address).delete(addresses::delete_address),
        )
        // Seller onboarding & profile
        .route("/api/seller/onboarding/config", get(onboarding::get_config))
        .route("/api/seller/onboarding", get(onboarding::get_progress))
        .route(
            "/api/seller/onboarding/steps/:key",
            put(onboarding::submit_step),
        )
        .route(
            "/api/seller/onboarding/steps/:key/skip",
            post(onboarding::skip_step),
        )
        .route(
            "/api/seller/onboarding/submit",
            post(onboarding::submit_onboarding),
        )
        .route("/api/seller/documents", post(onboarding::add_document))
        .route(
            "/api/seller/profile",
            get(onboarding::get_profile).put(onboarding::update_profile),
        )
        // Seller products
        .route(
            "/api/seller/products",
            get(seller_products::list_products).post(seller_products::create_product),
        )
        .route(
            "/api/seller/products/validate-step",
            post(seller_products::validate_step),
        )
        .route(
            "/api/seller/products/:id",
            put(seller_products::update_product).delete(seller_products::delete_product),
        )
        .route(
            "/api/seller/products/:id/technical-details",
            put(seller_products::update_technical_details),
        )
        // Admin
        .route("/api/admin/users", get(admin::list_users))
        .route(
            "/api/admin/users/:id",
            patch(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/products", get(admin::list_products))
        .route(
            "/api/admin/products/:id/status",
            patch(admin::update_product_status),
        )
        .route("/api/admin/products/:id", delete(admin::delete_product))
        .route(
            "/api/admin/locations",
            get(admin::list_locations).post(admin::create_location),
        )
        .route(
            "/api/admin/locations/:id",
            put(admin::update_location).delete(admin::delete_location),
        )
        .route(
            "/api/admin/onboarding-config",
            get(admin::get_onboarding_config).put(admin::update_onboarding_config),
        )
        .route(
            "/api/admin/onboarding-config/steps/:id",
            put(admin::update_onboarding_step),
        )
        .route(
            "/api/admin/onboarding-config/document-types",
            post(admin::create_document_type),
        )
        .route(
            "/api/admin/onboarding-config/document-types/:id",
            put(admin::update_document_type).delete(admin::delete_document_type),
        )
        .route("/api/admin/sellers", get(admin::list_sellers))
        .route("/api/admin/sellers/:id/approve", post(admin::approve_seller))
        .route("/api/admin/sellers/:id/reject", post(admin::reject_seller))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_state;
    use crate::domain::users::Role;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn router() -> (Router, Arc<AppState>) {
        let state = test_state();
        (api_router().with_state(state.clone()), state)
    }

    fn token(state: &AppState, role: Role) -> String {
        state
            .jwt
            .issue(Uuid::new_v4(), "someone@emall.world", role, None)
            .unwrap()
    }

    async fn send(
        router: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                request = request.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for (method, uri) in [
            ("GET", "/api/auth/me"),
            ("GET", "/api/cart"),
            ("GET", "/api/addresses"),
            ("GET", "/api/seller/onboarding"),
            ("GET", "/api/admin/users"),
        ] {
            let (router, _) = router();
            let (status, body) = send(router, method, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn role_routes_reject_other_roles() {
        let (router, state) = router();
        let customer = token(&state, Role::Customer);
        let (status, body) = send(router, "GET", "/api/admin/users", Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin privileges required");

        let (router, state) = self::router();
        let admin = token(&state, Role::Admin);
        let (status, _) = send(router, "GET", "/api/seller/products", Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn registration_reports_every_invalid_field() {
        let (router, _) = router();
        let (status, body) = send(
            router,
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({"name": "", "email": "nope", "password": "123"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"]["name"][0], "Name is required");
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["password"].is_array());
    }

    #[tokio::test]
    async fn analytics_proxy_validates_then_accepts() {
        let (router, _) = router();
        let (status, _) = send(
            router,
            "POST",
            "/api/ga-proxy/ga-event",
            None,
            Some(serde_json::json!({"client_id": "1.2", "name": "bad name"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (router, _) = self::router();
        let (status, body) = send(
            router,
            "POST",
            "/api/ga-proxy/ga-event",
            None,
            Some(serde_json::json!({"client_id": "1.2", "name": "view_item", "params": {"id": "p1"}})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["message"], "Event accepted");
    }

    #[tokio::test]
    async fn logout_is_stateless() {
        let (router, state) = router();
        let customer = token(&state, Role::Customer);
        let (status, body) = send(router, "POST", "/api/auth/logout", Some(&customer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logged out");
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (router, _) = router();
        let (status, _) = send(router, "GET", "/api/orders", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "Requires a running Postgres at DATABASE_URL"]
    async fn deactivated_customer_is_locked_out_of_cart() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let pool = sqlx::PgPool::connect(&url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let template = test_state();
        let state = AppState::new(pool.clone(), template.settings.clone(), None, None);

        let email = format!("{}@emall.world", Uuid::new_v4());
        let (user_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash, role) VALUES ('Ravi', $1, 'x', 'customer') RETURNING id",
        )
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
        let token = state.jwt.issue(user_id, &email, Role::Customer, None).unwrap();

        let router = api_router().with_state(state.clone());
        let (status, _) = send(router, "GET", "/api/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let router = api_router().with_state(state);
        let (status, body) = send(router, "GET", "/api/cart", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Account is deactivated");

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
