use serde_json::{Map, Value};

use crate::client::http::ApiClient;
use crate::domain::analytics::AnalyticsEvent;

impl ApiClient {
    /// Post an event to the analytics proxy. Failures are logged and never
    /// shown to the user.
    pub async fn track_event(&self, name: &str, params: Map<String, Value>) {
        let event = AnalyticsEvent {
            client_id: self.session().ga_client_id(),
            name: name.to_string(),
            params,
        };
        let url = self.config().api_url("/ga-proxy/ga-event");

        match self.http().post(url).json(&event).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::debug!(event = %event.name, status = response.status().as_u16(), "Analytics event rejected");
            }
            Err(e) => {
                tracing::debug!(event = %event.name, error = %e, "Analytics event not sent");
            }
        }
    }
}
