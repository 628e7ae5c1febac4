//! Google Analytics Measurement Protocol forwarder.
//!
//! Browsers post events to the proxy route; the service relays them so the
//! API secret never leaves the server.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::domain::analytics::AnalyticsEvent;

const COLLECT_URL: &str = "https://www.google-analytics.com/mp/collect";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("analytics request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analytics endpoint rejected event with status {0}")]
    Rejected(StatusCode),
}

impl ForwardError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Rejected(status) => status.is_server_error(),
        }
    }
}

#[derive(Serialize)]
struct CollectPayload<'a> {
    client_id: &'a str,
    events: [CollectEvent<'a>; 1],
}

#[derive(Serialize)]
struct CollectEvent<'a> {
    name: &'a str,
    params: &'a serde_json::Map<String, serde_json::Value>,
}

/// Relays events to the Measurement Protocol collect endpoint.
#[derive(Clone)]
pub struct AnalyticsForwarder {
    client: Client,
    endpoint: String,
    measurement_id: String,
    api_secret: String,
}

impl AnalyticsForwarder {
    pub fn new(client: Client, measurement_id: &str, api_secret: &str) -> Self {
        Self::with_endpoint(client, COLLECT_URL, measurement_id, api_secret)
    }

    pub fn with_endpoint(
        client: Client,
        endpoint: &str,
        measurement_id: &str,
        api_secret: &str,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            measurement_id: measurement_id.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    /// Build a forwarder when both GA settings are present.
    pub fn from_settings(
        client: Client,
        measurement_id: Option<&str>,
        api_secret: Option<&str>,
    ) -> Option<Self> {
        match (measurement_id, api_secret) {
            (Some(id), Some(secret)) => Some(Self::new(client, id, secret)),
            _ => None,
        }
    }

    /// Forward one event, retrying server errors and connection failures a
    /// fixed number of times.
    #[instrument(skip(self, event), fields(event = %event.name))]
    pub async fn forward(&self, event: &AnalyticsEvent) -> Result<(), ForwardError> {
        let mut attempt = 1;
        loop {
            match self.send_once(event).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    warn!(attempt, error = %e, "Analytics forward failed, retrying");
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, event: &AnalyticsEvent) -> Result<(), ForwardError> {
        let payload = CollectPayload {
            client_id: &event.client_id,
            events: [CollectEvent {
                name: &event.name,
                params: &event.params,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("measurement_id", self.measurement_id.as_str()),
                ("api_secret", self.api_secret.as_str()),
            ])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Analytics collect response");

        if status.is_success() {
            Ok(())
        } else {
            Err(ForwardError::Rejected(status))
        }
    }
}

/// Shared HTTP client for outbound calls.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> AnalyticsEvent {
        let mut params = serde_json::Map::new();
        params.insert("item_id".into(), serde_json::json!("sku-1"));
        AnalyticsEvent {
            client_id: "555.777".into(),
            name: "add_to_cart".into(),
            params,
        }
    }

    fn forwarder(server: &MockServer) -> AnalyticsForwarder {
        AnalyticsForwarder::with_endpoint(
            Client::new(),
            &format!("{}/mp/collect", server.uri()),
            "G-TEST",
            "secret",
        )
    }

    #[test]
    fn forwarder_requires_both_settings() {
        assert!(AnalyticsForwarder::from_settings(Client::new(), Some("G-1"), None).is_none());
        assert!(AnalyticsForwarder::from_settings(Client::new(), Some("G-1"), Some("s")).is_some());
    }

    #[tokio::test]
    async fn forwards_event_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mp/collect"))
            .and(query_param("measurement_id", "G-TEST"))
            .and(query_param("api_secret", "secret"))
            .and(body_partial_json(serde_json::json!({
                "client_id": "555.777",
                "events": [{ "name": "add_to_cart" }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        forwarder(&server).forward(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(u64::from(MAX_ATTEMPTS))
            .mount(&server)
            .await;

        let err = forwarder(&server).forward(&event()).await.unwrap_err();
        assert!(matches!(err, ForwardError::Rejected(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        assert!(forwarder(&server).forward(&event()).await.is_err());
    }
}
