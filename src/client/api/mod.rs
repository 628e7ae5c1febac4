//! One method per REST endpoint, grouped by resource.
//!
//! All methods live on [`ApiClient`](super::ApiClient) and share its auth and
//! error policy.

mod analytics;
mod auth;
mod cart;
mod catalog;
mod onboarding;
mod reviews;
mod seller;
mod stores;
mod technical_details;

pub use onboarding::OnboardingFlow;
pub use seller::ProductDraft;
