//! Analytics proxy

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::MessageResponse;
use crate::app::AppState;
use crate::domain::analytics::AnalyticsEvent;
use crate::error::ApiError;
use crate::validation::ValidationErrors;

const MAX_PARAMS: usize = 25;

fn validate_event(event: &AnalyticsEvent) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::default();
    if event.client_id.trim().is_empty() {
        errors.add("client_id", "Client id is required");
    }
    if !event.has_valid_name() {
        errors.add(
            "name",
            "Event names use letters, digits and underscores and start with a letter",
        );
    }
    if event.params.len() > MAX_PARAMS {
        errors.add("params", format!("At most {} parameters per event", MAX_PARAMS));
    }
    errors.into_result()?;
    Ok(())
}

/// POST /api/ga-proxy/ga-event
///
/// Accept an event and relay it in the background. Without GA credentials the
/// event is only logged.
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<AnalyticsEvent>,
) -> Result<impl IntoResponse, ApiError> {
    validate_event(&event)?;

    match state.analytics.clone() {
        Some(forwarder) => {
            tokio::spawn(async move {
                if let Err(e) = forwarder.forward(&event).await {
                    tracing::warn!(event = %event.name, error = %e, "Analytics event dropped");
                }
            });
        }
        None => {
            tracing::debug!(event = %event.name, client_id = %event.client_id, "Analytics not configured, event logged only");
        }
    }

    Ok((StatusCode::ACCEPTED, Json(MessageResponse::new("Event accepted"))))
}
