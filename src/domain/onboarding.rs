//! Onboarding configuration types
//!
//! The configuration is owned by admins and delivered to sellers before the
//! onboarding wizard starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::wizard::StepConfig;

/// Onboarding step row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnboardingStep {
    pub id: Uuid,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub is_required: bool,
    pub is_active: bool,
}

impl From<OnboardingStep> for StepConfig {
    fn from(step: OnboardingStep) -> Self {
        Self {
            key: step.key,
            title: step.title,
            description: step.description,
            position: step.position,
            is_required: step.is_required,
            is_active: step.is_active,
        }
    }
}

/// Verification document type
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub is_active: bool,
    pub accepted_formats: Vec<String>,
    pub max_size_mb: i32,
}

impl DocumentType {
    /// Whether the file's extension is one of the accepted formats. Query
    /// strings and fragments are ignored.
    pub fn accepts(&self, file_url: &str) -> bool {
        let path = file_url.split(['?', '#']).next().unwrap_or_default();
        let Some((_, ext)) = path.rsplit_once('.') else {
            return false;
        };
        if ext.contains('/') {
            return false;
        }
        self.accepted_formats
            .iter()
            .any(|f| f.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Complete configuration as delivered to the wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    pub allow_skipping: bool,
    pub steps: Vec<OnboardingStep>,
    pub document_types: Vec<DocumentType>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OnboardingConfig {
    /// Active steps as wizard configuration
    pub fn step_configs(&self) -> Vec<StepConfig> {
        self.steps
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .map(StepConfig::from)
            .collect()
    }

    /// Ids of active document types that must be uploaded
    pub fn required_document_types(&self) -> Vec<Uuid> {
        self.document_types
            .iter()
            .filter(|d| d.is_active && d.is_required)
            .map(|d| d.id)
            .collect()
    }
}

/// A seller's onboarding progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub status: super::sellers::OnboardingStatus,
    pub current_step: Option<String>,
    pub completed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub missing_required: Vec<String>,
    pub progress_percent: u8,
    pub can_skip: bool,
    pub rejection_reason: Option<String>,
}

/// Admin update of the global flags
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateOnboardingConfigRequest {
    pub allow_skipping: bool,
}

/// Admin update of a single step
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateOnboardingStepRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Admin create/update of a document type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentTypeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_formats")]
    pub accepted_formats: Vec<String>,
    #[serde(default = "default_max_size")]
    pub max_size_mb: i32,
}

fn default_true() -> bool {
    true
}

fn default_formats() -> Vec<String> {
    vec!["pdf".to_string(), "jpg".to_string(), "png".to_string()]
}

fn default_max_size() -> i32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(key: &str, position: i32, active: bool) -> OnboardingStep {
        OnboardingStep {
            id: Uuid::new_v4(),
            key: key.to_string(),
            title: key.to_string(),
            description: None,
            position,
            is_required: true,
            is_active: active,
        }
    }

    fn doc(required: bool, active: bool) -> DocumentType {
        DocumentType {
            id: Uuid::new_v4(),
            name: "PAN".to_string(),
            description: None,
            is_required: required,
            is_active: active,
            accepted_formats: default_formats(),
            max_size_mb: 5,
        }
    }

    #[test]
    fn document_formats_match_extension() {
        let pan = doc(true, true);
        assert!(pan.accepts("/uploads/pan.PDF"));
        assert!(pan.accepts("https://cdn.example.com/docs/pan.jpg?sig=abc"));
        assert!(!pan.accepts("/uploads/pan.docx"));
        assert!(!pan.accepts("/uploads.d/pan"));
    }

    #[test]
    fn only_active_steps_reach_the_wizard() {
        let config = OnboardingConfig {
            allow_skipping: false,
            steps: vec![step("a", 1, true), step("b", 2, false)],
            document_types: Vec::new(),
            updated_at: None,
        };

        let keys: Vec<String> = config.step_configs().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn required_documents_exclude_inactive_and_optional() {
        let required = doc(true, true);
        let config = OnboardingConfig {
            allow_skipping: true,
            steps: Vec::new(),
            document_types: vec![required.clone(), doc(false, true), doc(true, false)],
            updated_at: None,
        };

        assert_eq!(config.required_document_types(), vec![required.id]);
    }

    #[test]
    fn document_type_request_defaults() {
        let req: DocumentTypeRequest = serde_json::from_str(r#"{"name": "Trade license"}"#).unwrap();
        assert!(req.is_required);
        assert_eq!(req.accepted_formats, vec!["pdf", "jpg", "png"]);
        assert_eq!(req.max_size_mb, 5);
    }
}
