//! Client-side credential and preference storage
//!
//! Three scopes: `local` (survives restarts), `session` (one browsing
//! session) and `cookies` (a mirror of the token for server-rendered pages).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::users::{AuthResponse, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const GA_CLIENT_ID_KEY: &str = "ga_client_id";
pub const RETURN_URL_KEY: &str = "returnUrl";

/// String key/value storage. Last write wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// Credentials and client identifiers shared by the HTTP client, the
/// navigator helpers and analytics.
#[derive(Clone)]
pub struct Session {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            local,
            session,
            cookies,
        }
    }

    /// All three scopes in memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    pub fn token(&self) -> Option<String> {
        self.local.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Stored user. An unreadable entry is treated as absent.
    pub fn user(&self) -> Option<User> {
        let raw = self.local.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored user");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.local.set(USER_KEY, raw),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user"),
        }
    }

    /// Persist a successful login or registration.
    pub fn store_login(&self, auth: &AuthResponse) {
        self.local.set(TOKEN_KEY, auth.token.clone());
        self.cookies.set(TOKEN_KEY, auth.token.clone());
        self.set_user(&auth.user);
    }

    /// Forget the token, its cookie mirror and the stored user.
    pub fn clear_credentials(&self) {
        self.local.remove(TOKEN_KEY);
        self.local.remove(USER_KEY);
        self.cookies.remove(TOKEN_KEY);
    }

    /// Analytics client id, created on first use in the `<random>.<unix-seconds>`
    /// form the Measurement Protocol expects.
    pub fn ga_client_id(&self) -> String {
        if let Some(id) = self.local.get(GA_CLIENT_ID_KEY).filter(|id| !id.is_empty()) {
            return id;
        }
        let random = Uuid::new_v4().as_u128() as u32;
        let id = format!("{}.{}", random, chrono::Utc::now().timestamp());
        self.local.set(GA_CLIENT_ID_KEY, id.clone());
        id
    }

    pub fn set_return_url(&self, url: &str) {
        self.session.set(RETURN_URL_KEY, url.to_string());
    }

    pub fn return_url(&self) -> Option<String> {
        self.session.get(RETURN_URL_KEY)
    }

    /// Read and forget the return URL.
    pub fn take_return_url(&self) -> Option<String> {
        let url = self.session.get(RETURN_URL_KEY)?;
        self.session.remove(RETURN_URL_KEY);
        Some(url)
    }

    #[cfg(test)]
    fn cookie_token(&self) -> Option<String> {
        self.cookies.get(TOKEN_KEY)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::Role;

    fn auth_response(role: Role) -> AuthResponse {
        AuthResponse {
            token: "jwt-token".into(),
            expires_in: 3600,
            user: User {
                id: Uuid::new_v4(),
                name: "Asha".into(),
                email: "asha@emall.world".into(),
                phone: None,
                role,
                is_active: true,
                onboarding_status: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn login_is_stored_and_cleared_with_cookie_mirror() {
        let session = Session::in_memory();
        let auth = auth_response(Role::Customer);
        session.store_login(&auth);

        assert_eq!(session.token().as_deref(), Some("jwt-token"));
        assert_eq!(session.cookie_token().as_deref(), Some("jwt-token"));
        assert_eq!(session.user(), Some(auth.user));

        session.clear_credentials();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.cookie_token().is_none());
    }

    #[test]
    fn ga_client_id_is_stable() {
        let session = Session::in_memory();
        let id = session.ga_client_id();
        assert_eq!(id.split('.').count(), 2);
        assert_eq!(session.ga_client_id(), id);

        session.clear_credentials();
        assert_eq!(session.ga_client_id(), id);
    }

    #[test]
    fn return_url_is_taken_once() {
        let session = Session::in_memory();
        session.set_return_url("/cart");
        assert_eq!(session.take_return_url().as_deref(), Some("/cart"));
        assert!(session.take_return_url().is_none());
    }

    #[test]
    fn corrupt_user_entry_reads_as_absent() {
        let local = Arc::new(MemoryStore::new());
        local.set(USER_KEY, "{not json".into());
        let session = Session::new(local, Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        assert!(session.user().is_none());
    }
}
