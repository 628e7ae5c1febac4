use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::client::navigation::post_login_destination;
use crate::domain::users::{AuthResponse, LoginRequest, RegisterRequest, User};

impl ApiClient {
    /// Log in, store the credentials and move to the landing page.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.post("/auth/login", &request).await?;
        Ok(self.finish_login(auth))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        let auth: AuthResponse = self.post("/auth/register", request).await?;
        Ok(self.finish_login(auth))
    }

    fn finish_login(&self, auth: AuthResponse) -> User {
        self.session().store_login(&auth);
        let destination = post_login_destination(self.session(), &auth.user);
        self.navigator().navigate(&destination);
        tracing::info!(user_id = %auth.user.id, role = %auth.user.role, "Logged in");
        auth.user
    }

    /// Refresh the stored user from the server.
    pub async fn me(&self) -> Result<User, ClientError> {
        let user: User = self.get("/auth/me").await?;
        self.session().set_user(&user);
        Ok(user)
    }

    /// Tokens are stateless; the server call only confirms. Local credentials
    /// are dropped even when it fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.post_message("/auth/logout", &serde_json::json!({})).await;
        self.session().clear_credentials();
        self.navigator().navigate(crate::client::navigation::LOGIN_PATH);
        result.map(|_| ())
    }
}
