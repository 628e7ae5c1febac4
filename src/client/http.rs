//! Shared API client
//!
//! Every SDK call goes through [`ApiClient`]. Requests carry the stored
//! bearer token; failed responses are surfaced through the [`Notifier`] and
//! a 401 outside the public pages signs the user out and sends them to login.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::config::ApiConfig;
use super::errors::ClientError;
use super::navigation::{is_public_path, redirect_to_login, Navigator};
use super::notify::Notifier;
use super::session::Session;
use crate::api::{DataResponse, Paginated, PaginationParams};

/// Applies to every request, including image probes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Query for listings that take no filters.
pub(crate) const NO_FILTER: &[(&str, &str)] = &[];

/// Cloneable handle; clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ApiConfig,
    session: Session,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: ApiConfig,
        session: Session,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                session,
                notifier,
                navigator,
            }),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.inner.navigator.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.inner.config.api_url(path);
        let builder = self.inner.http.request(method, url);
        match self.inner.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a `{ "data": T }` envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        unwrap_data(response).await
    }

    /// GET a paginated listing. Unset filters are left out of the query.
    pub(crate) async fn get_page<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        filter: &Q,
        pagination: PaginationParams,
    ) -> Result<Paginated<T>, ClientError> {
        let request = self
            .request(Method::GET, path)
            .query(filter)
            .query(&pagination);
        let response = self.send(request).await?;
        parse_json(response).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        unwrap_data(response).await
    }

    /// POST whose reply is a bare `{ "message": ... }`.
    pub(crate) async fn post_message<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, ClientError> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        let body: Value = parse_json(response).await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::PUT, path).json(body)).await?;
        unwrap_data(response).await
    }

    /// DELETE whose reply is `204 No Content` or a cart-style envelope the
    /// caller does not need.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// DELETE returning a `{ "data": T }` envelope.
    pub(crate) async fn delete_for<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::DELETE, path)).await?;
        unwrap_data(response).await
    }

    #[instrument(skip_all)]
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = ClientError::from(e);
                warn!(error = %error, "API request failed");
                self.inner.notifier.error(&error.user_message());
                return Err(error);
            }
        };

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "API response");
        if status.is_success() {
            return Ok(response);
        }

        Err(self.parse_error(response).await)
    }

    /// Turn a failed response into an error, surfacing its messages and
    /// applying the sign-out policy for 401s.
    async fn parse_error(&self, response: Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        let error = ClientError::from_response(status, &body);

        self.report(&error);
        if status == 401 {
            self.handle_unauthorized();
        }

        error
    }

    /// Show an error: the server's own message (or the category text), then
    /// one notification per field error.
    pub fn report(&self, error: &ClientError) {
        let headline = match error {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            _ => error.user_message(),
        };
        self.inner.notifier.error(&headline);
        for field in error.field_errors() {
            self.inner.notifier.error(&field.message);
        }
    }

    fn handle_unauthorized(&self) {
        let navigator = self.inner.navigator.as_ref();
        let path = navigator.current_path();
        if is_public_path(&path) {
            debug!(path = %path, "401 on a public page, keeping session");
            return;
        }

        warn!(path = %path, "Session rejected, signing out");
        self.inner.session.clear_credentials();
        redirect_to_login(&self.inner.session, navigator);
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Decode(format!("failed to parse response: {}", e)))
}

async fn unwrap_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let envelope: DataResponse<T> = parse_json(response).await?;
    Ok(envelope.data)
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::harness;
    use super::*;
    use crate::client::errors::ErrorCategory;
    use crate::client::navigation::LOGIN_PATH;
    use crate::client::session::MemoryStore;
    use crate::domain::users::AuthResponse;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login(session: &Session) {
        let auth: AuthResponse = serde_json::from_value(json!({
            "token": "tok-123",
            "expires_in": 3600,
            "user": {
                "id": "7d6f1c38-5d2a-4a55-9f7e-8f1f3b0f2a11",
                "name": "Asha",
                "email": "asha@emall.world",
                "role": "customer"
            }
        }))
        .unwrap();
        session.store_login(&auth);
    }

    #[tokio::test]
    async fn bearer_token_is_attached_and_envelope_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ok": true}})))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "/account");
        login(h.client.session());
        let body: Value = h.client.get("/auth/me").await.unwrap();
        assert_eq!(body, json!({"ok": true}));
        assert!(h.notifier.entries().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_on_private_page_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"code": "UNAUTHORIZED", "message": "Token expired"})),
            )
            .mount(&server)
            .await;

        let h = harness(&server, "/cart");
        login(h.client.session());
        let err = h.client.get::<Value>("/cart").await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(!h.client.session().is_authenticated());
        assert!(h.client.session().user().is_none());
        assert_eq!(h.navigator.current_path(), LOGIN_PATH);
        assert_eq!(h.client.session().return_url().as_deref(), Some("/cart"));
        assert_eq!(h.notifier.messages(), vec!["Token expired".to_string()]);
    }

    #[tokio::test]
    async fn unauthorized_on_public_page_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
            .mount(&server)
            .await;

        let h = harness(&server, "/products/abc");
        login(h.client.session());
        assert!(h.client.get::<Value>("/auth/me").await.is_err());

        assert!(h.client.session().is_authenticated());
        assert_eq!(h.navigator.history(), vec!["/products/abc".to_string()]);
    }

    #[tokio::test]
    async fn field_errors_are_surfaced_one_by_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/addresses"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "VALIDATION_ERROR",
                "message": "Validation failed",
                "errors": {"pincode": ["Enter a valid 6-digit pincode"], "city": ["City is required"]}
            })))
            .mount(&server)
            .await;

        let h = harness(&server, "/checkout");
        let err = h
            .client
            .post::<Value, _>("/addresses", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.field_errors().len(), 2);
        let messages = h.notifier.messages();
        assert_eq!(messages[0], "Validation failed");
        assert!(messages.contains(&"City is required".to_string()));
        assert!(messages.contains(&"Enter a valid 6-digit pincode".to_string()));
        // Not a 401, so the user stays put.
        assert_eq!(h.navigator.current_path(), "/checkout");
    }

    #[tokio::test]
    async fn server_errors_without_body_use_canned_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/deals"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let h = harness(&server, "/deals");
        let err = h.client.get::<Value>("/deals").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_eq!(
            h.notifier.messages(),
            vec![ErrorCategory::Server.default_message().to_string()]
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let notifier = Arc::new(crate::client::notify::RecordingNotifier::new());
        let client = ApiClient::new(
            ApiConfig::new("http://127.0.0.1:1").unwrap(),
            Session::new(
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryStore::new()),
            ),
            notifier.clone(),
            Arc::new(crate::client::navigation::MemoryNavigator::default()),
        )
        .unwrap();

        let err = client.get::<Value>("/health").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(notifier.messages().len(), 1);
    }
}
