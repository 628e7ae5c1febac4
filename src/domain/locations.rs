use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Serviceable location that shops are grouped under
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationRequest {
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
