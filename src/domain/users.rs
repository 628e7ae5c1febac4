//! User accounts and authentication DTOs

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::validation::{FieldRules, RuleSet};
use crate::wizard::steps::phone_regex;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" | "user" => Some(Self::Customer),
            "seller" => Some(Self::Seller),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public user shape. This is what clients store after login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Seller onboarding status, present for sellers only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: Role::parse(&row.role).unwrap_or_default(),
            is_active: row.is_active,
            onboarding_status: None,
            created_at: Some(row.created_at),
        }
    }
}

/// Role a caller may pick at registration. Admins are never self-registered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegisterRole {
    #[default]
    Customer,
    Seller,
}

impl From<RegisterRole> for Role {
    fn from(r: RegisterRole) -> Self {
        match r {
            RegisterRole::Customer => Role::Customer,
            RegisterRole::Seller => Role::Seller,
        }
    }
}

/// Register request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: RegisterRole,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern compiles")
    })
}

/// Registration form rules
pub fn registration_rules() -> RuleSet {
    RuleSet::new()
        .field(FieldRules::new("name", "Name").required().min_length(2).max_length(100))
        .field(
            FieldRules::new("email", "Email")
                .required()
                .pattern(email_regex(), "Enter a valid email address"),
        )
        .field(
            FieldRules::new("password", "Password")
                .required()
                .min_length(MIN_PASSWORD_LENGTH),
        )
        .field(
            FieldRules::new("phone", "Phone number")
                .pattern(phone_regex(), "Enter a valid 10-digit mobile number"),
        )
}

/// Login form rules
pub fn login_rules() -> RuleSet {
    RuleSet::new()
        .field(FieldRules::new("email", "Email").required())
        .field(FieldRules::new("password", "Password").required())
}

/// Token plus user, returned by login and register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}
