//! Seller (shop) domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Seller onboarding lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

impl OnboardingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Sellers may edit onboarding data until it is submitted, and again
    /// after a rejection.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::NotStarted | Self::InProgress | Self::Rejected)
    }
}

impl From<String> for OnboardingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_progress" => Self::InProgress,
            "submitted" => Self::Submitted,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::NotStarted,
        }
    }
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seller row
#[derive(Debug, Clone, FromRow)]
pub struct SellerRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shop_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub gst_number: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub working_days: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub location_id: Option<Uuid>,
    pub onboarding_status: String,
    pub completed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seller as returned to the seller and to admins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shop_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub gst_number: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub working_days: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub location_id: Option<Uuid>,
    pub onboarding_status: OnboardingStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SellerRow> for Seller {
    fn from(row: SellerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            shop_name: row.shop_name,
            description: row.description,
            category: row.category,
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            phone: row.phone,
            gst_number: row.gst_number,
            opening_time: row.opening_time,
            closing_time: row.closing_time,
            working_days: row.working_days,
            logo_url: row.logo_url,
            banner_url: row.banner_url,
            location_id: row.location_id,
            onboarding_status: row.onboarding_status.into(),
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        }
    }
}

/// Public shop card for the Shops page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub shop_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub working_days: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub location_id: Option<Uuid>,
    pub product_count: i64,
}

/// Seller profile fields editable outside the onboarding wizard
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateSellerProfileRequest {
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub working_days: Option<Vec<String>>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

/// Uploaded verification document
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellerDocument {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub document_type_id: Uuid,
    pub file_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Request to attach a document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddDocumentRequest {
    pub document_type_id: Uuid,
    pub file_url: String,
}

/// `basic_details` onboarding step payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicDetailsForm {
    pub shop_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

/// `shop_timing` onboarding step payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopTimingForm {
    pub opening_time: String,
    pub closing_time: String,
    pub working_days: Vec<String>,
}

/// `document_verification` onboarding step payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsForm {
    pub documents: Vec<AddDocumentRequest>,
}

/// Query params for the Shops page
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StoreQuery {
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}
