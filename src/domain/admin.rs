//! Admin domain types
//!
//! Types for the admin panel: user and product moderation, seller approval.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::ProductStatus;
use super::sellers::{Seller, SellerDocument};
use super::users::Role;

/// Admin action types, recorded in the audit log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    UpdateUser,
    DeleteUser,
    UpdateProductStatus,
    DeleteProduct,
    ApproveSeller,
    RejectSeller,
    UpdateOnboardingConfig,
    UpdateLocation,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// What an audited action touched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditTargetType {
    User,
    Product,
    Seller,
    Location,
    OnboardingConfig,
}

impl std::fmt::Display for AuditTargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// Query params for the user table
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminUserQuery {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Admin edit of a user
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminUpdateUserRequest {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Query params for the product table
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminProductQuery {
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub seller_id: Option<Uuid>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateProductStatusRequest {
    pub status: ProductStatus,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

/// Query params for the seller review queue
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminSellerQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RejectSellerRequest {
    pub reason: String,
}

/// Seller application as shown in the review queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerApplication {
    #[serde(flatten)]
    pub seller: Seller,
    pub owner_name: String,
    pub owner_email: String,
    pub documents: Vec<SellerDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_displays_as_snake_case() {
        assert_eq!(AdminAction::ApproveSeller.to_string(), "approve_seller");
        assert_eq!(AdminAction::UpdateOnboardingConfig.to_string(), "update_onboarding_config");
        assert_eq!(AuditTargetType::OnboardingConfig.to_string(), "onboarding_config");
    }
}
