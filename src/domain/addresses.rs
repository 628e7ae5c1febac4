use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{FieldRules, RuleSet};
use crate::wizard::steps::{phone_regex, pincode_regex};

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub label: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address form rules
pub fn address_rules() -> RuleSet {
    RuleSet::new()
        .field(FieldRules::new("line1", "Address line").required().max_length(200))
        .field(FieldRules::new("city", "City").required())
        .field(FieldRules::new("state", "State").required())
        .field(
            FieldRules::new("pincode", "Pincode")
                .required()
                .pattern(pincode_regex(), "Enter a valid 6-digit pincode"),
        )
        .field(
            FieldRules::new("phone", "Phone number")
                .required()
                .pattern(phone_regex(), "Enter a valid 10-digit mobile number"),
        )
}
