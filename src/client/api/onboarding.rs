use serde_json::{json, Value};

use crate::client::errors::ClientError;
use crate::client::http::ApiClient;
use crate::domain::onboarding::{OnboardingConfig, OnboardingProgress};
use crate::domain::sellers::{AddDocumentRequest, OnboardingStatus, Seller, SellerDocument, UpdateSellerProfileRequest};
use crate::wizard::steps::{default_onboarding_steps, OnboardingRules};
use crate::wizard::{StepConfig, Wizard, WizardError};

/// A seller's onboarding wizard, mirrored locally so each step is checked
/// before it is sent.
pub struct OnboardingFlow {
    config: OnboardingConfig,
    wizard: Wizard<OnboardingRules>,
    progress: OnboardingProgress,
}

impl OnboardingFlow {
    fn build(config: OnboardingConfig, progress: OnboardingProgress) -> Result<Self, ClientError> {
        let mut steps = config.step_configs();
        if steps.is_empty() {
            steps = default_onboarding_steps();
        }
        let wizard = Wizard::resume(
            steps,
            config.allow_skipping,
            OnboardingRules::new(config.required_document_types()),
            progress.completed_steps.clone(),
            progress.skipped_steps.clone(),
        )?;

        Ok(Self {
            config,
            wizard,
            progress,
        })
    }

    fn sync(&mut self, progress: OnboardingProgress) -> Result<(), ClientError> {
        let config = self.config.clone();
        *self = Self::build(config, progress)?;
        Ok(())
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    pub fn progress(&self) -> &OnboardingProgress {
        &self.progress
    }

    pub fn current_step(&self) -> Option<&StepConfig> {
        self.wizard.current_step()
    }

    pub fn can_skip(&self) -> bool {
        self.wizard.can_skip()
    }

    pub fn is_complete(&self) -> bool {
        self.wizard.is_complete()
    }

    /// Whether the seller can still change anything.
    pub fn is_editable(&self) -> bool {
        self.progress.status.is_editable()
    }

    /// Revisit the previous step. Nothing is sent.
    pub fn back(&mut self) -> Result<(), ClientError> {
        self.wizard.back()?;
        Ok(())
    }
}

impl ApiClient {
    pub async fn get_onboarding_config(&self) -> Result<OnboardingConfig, ClientError> {
        self.get("/seller/onboarding/config").await
    }

    pub async fn get_onboarding_progress(&self) -> Result<OnboardingProgress, ClientError> {
        self.get("/seller/onboarding").await
    }

    /// Load configuration and saved progress and position the wizard on the
    /// first open step.
    pub async fn start_onboarding(&self) -> Result<OnboardingFlow, ClientError> {
        let config = self.get_onboarding_config().await?;
        let progress = self.get_onboarding_progress().await?;
        OnboardingFlow::build(config, progress)
    }

    /// Validate the current step locally, then save it.
    pub async fn submit_onboarding_step(
        &self,
        flow: &mut OnboardingFlow,
        data: Value,
    ) -> Result<OnboardingProgress, ClientError> {
        let key = flow
            .current_step()
            .map(|s| s.key.clone())
            .ok_or_else(|| ClientError::from(WizardError::AlreadyComplete))?;

        if let Err(e) = flow.wizard.validate_step(&key, &data) {
            let error = ClientError::from(e);
            self.report(&error);
            return Err(error);
        }

        let progress: OnboardingProgress = self
            .put(&format!("/seller/onboarding/steps/{}", key), &data)
            .await?;
        flow.sync(progress)?;
        Ok(flow.progress().clone())
    }

    pub async fn skip_onboarding_step(
        &self,
        flow: &mut OnboardingFlow,
    ) -> Result<OnboardingProgress, ClientError> {
        let key = match flow.current_step() {
            Some(step) if flow.can_skip() => step.key.clone(),
            Some(step) => {
                let error = ClientError::from(WizardError::SkipNotAllowed(step.key.clone()));
                self.report(&error);
                return Err(error);
            }
            None => return Err(WizardError::AlreadyComplete.into()),
        };

        let progress: OnboardingProgress = self
            .post(&format!("/seller/onboarding/steps/{}/skip", key), &json!({}))
            .await?;
        flow.sync(progress)?;
        Ok(flow.progress().clone())
    }

    /// Hand the application to admins for review.
    pub async fn finish_onboarding(&self, flow: &mut OnboardingFlow) -> Result<OnboardingProgress, ClientError> {
        let progress: OnboardingProgress = self.post("/seller/onboarding/submit", &json!({})).await?;
        if let Some(mut user) = self.session().user() {
            user.onboarding_status = Some(progress.status.to_string());
            self.session().set_user(&user);
        }
        flow.sync(progress)?;
        Ok(flow.progress().clone())
    }

    pub async fn add_seller_document(&self, request: &AddDocumentRequest) -> Result<SellerDocument, ClientError> {
        self.post("/seller/documents", request).await
    }

    pub async fn get_seller_profile(&self) -> Result<Seller, ClientError> {
        let seller: Seller = self.get("/seller/profile").await?;
        if seller.onboarding_status == OnboardingStatus::Approved {
            if let Some(mut user) = self.session().user() {
                user.onboarding_status = Some(seller.onboarding_status.to_string());
                self.session().set_user(&user);
            }
        }
        Ok(seller)
    }

    pub async fn update_seller_profile(
        &self,
        request: &UpdateSellerProfileRequest,
    ) -> Result<Seller, ClientError> {
        self.put("/seller/profile", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::errors::ErrorCategory;
    use crate::client::http::test_support::harness;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(allow_skipping: bool, timing_required: bool) -> Value {
        json!({"data": {
            "allow_skipping": allow_skipping,
            "steps": [
                {"id": "00000000-0000-0000-0000-000000000001", "key": "basic_details", "title": "Basic Details",
                 "description": null, "position": 1, "is_required": true, "is_active": true},
                {"id": "00000000-0000-0000-0000-000000000002", "key": "shop_timing", "title": "Shop Timing",
                 "description": null, "position": 2, "is_required": timing_required, "is_active": true},
                {"id": "00000000-0000-0000-0000-000000000003", "key": "document_verification", "title": "Documents",
                 "description": null, "position": 3, "is_required": true, "is_active": true}
            ],
            "document_types": []
        }})
    }

    fn progress(status: &str, completed: &[&str], skipped: &[&str], current: Option<&str>) -> Value {
        json!({"data": {
            "status": status,
            "current_step": current,
            "completed_steps": completed,
            "skipped_steps": skipped,
            "missing_required": [],
            "progress_percent": 0,
            "can_skip": false,
            "rejection_reason": null
        }})
    }

    async fn mount_start(server: &MockServer, config_body: Value, progress_body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/seller/onboarding/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(config_body))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/seller/onboarding"))
            .respond_with(ResponseTemplate::new(200).set_body_json(progress_body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resumes_at_first_open_step() {
        let server = MockServer::start().await;
        mount_start(
            &server,
            config(false, true),
            progress("in_progress", &["basic_details"], &[], Some("shop_timing")),
        )
        .await;

        let h = harness(&server, "/seller/onboarding");
        let flow = h.client.start_onboarding().await.unwrap();
        assert_eq!(flow.current_step().unwrap().key, "shop_timing");
        assert!(!flow.can_skip());
        assert!(flow.is_editable());
    }

    #[tokio::test]
    async fn invalid_step_never_reaches_the_server() {
        let server = MockServer::start().await;
        mount_start(&server, config(false, true), progress("not_started", &[], &[], Some("basic_details"))).await;
        Mock::given(method("PUT"))
            .and(path("/api/seller/onboarding/steps/basic_details"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server, "/seller/onboarding");
        let mut flow = h.client.start_onboarding().await.unwrap();
        let err = h
            .client
            .submit_onboarding_step(&mut flow, json!({"shop_name": "My Shop"}))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.field_errors().iter().any(|f| f.field.as_deref() == Some("pincode")));
        assert_eq!(flow.current_step().unwrap().key, "basic_details");
    }

    #[tokio::test]
    async fn valid_step_is_saved_and_flow_moves_on() {
        let server = MockServer::start().await;
        mount_start(&server, config(true, false), progress("not_started", &[], &[], Some("basic_details"))).await;
        Mock::given(method("PUT"))
            .and(path("/api/seller/onboarding/steps/basic_details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(progress(
                "in_progress",
                &["basic_details"],
                &[],
                Some("shop_timing"),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/seller/onboarding/steps/shop_timing/skip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(progress(
                "in_progress",
                &["basic_details"],
                &["shop_timing"],
                Some("document_verification"),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "/seller/onboarding");
        let mut flow = h.client.start_onboarding().await.unwrap();
        h.client
            .submit_onboarding_step(
                &mut flow,
                json!({
                    "shop_name": "Green Grocers",
                    "category": "Groceries",
                    "phone": "9876543210",
                    "address": "12 MG Road",
                    "city": "Pune",
                    "state": "Maharashtra",
                    "pincode": "411001"
                }),
            )
            .await
            .unwrap();
        assert_eq!(flow.current_step().unwrap().key, "shop_timing");
        assert!(flow.can_skip());

        let progress = h.client.skip_onboarding_step(&mut flow).await.unwrap();
        assert_eq!(progress.skipped_steps, vec!["shop_timing".to_string()]);
        assert_eq!(flow.current_step().unwrap().key, "document_verification");
        assert!(!flow.can_skip());
    }

    #[tokio::test]
    async fn required_step_cannot_be_skipped_locally() {
        let server = MockServer::start().await;
        mount_start(&server, config(true, true), progress("in_progress", &["basic_details"], &[], Some("shop_timing"))).await;

        let h = harness(&server, "/seller/onboarding");
        let mut flow = h.client.start_onboarding().await.unwrap();
        let err = h.client.skip_onboarding_step(&mut flow).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(flow.current_step().unwrap().key, "shop_timing");
        assert_eq!(h.notifier.messages().len(), 1);
    }
}
