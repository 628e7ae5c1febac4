use serde::{Deserialize, Serialize};

/// JWT claims issued by the login and register endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// User email
    pub email: String,

    /// User role (`customer`, `seller`, `admin`)
    pub role: String,

    /// Display name - optional
    #[serde(default)]
    pub name: Option<String>,
}
