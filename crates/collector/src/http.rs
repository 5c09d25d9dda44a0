//! HTTP collector — POSTs event payloads as JSON.
//!
//! A delivery succeeds only on a 2xx status with a JSON body. Transport
//! errors, other statuses, and unparsable bodies all surface as
//! [`CollectorError`]s so the agent can re-enqueue the event.

use async_trait::async_trait;
use pagetrack_config::TrackerConfig;
use pagetrack_core::collector::{Collector, Delivery};
use pagetrack_core::error::CollectorError;
use pagetrack_core::event::{Ack, TrackPayload};
use std::time::Duration;
use tracing::{debug, warn};

/// A collector reached over HTTP.
pub struct HttpCollector {
    endpoint: String,
    track_url: String,
    client: reqwest::Client,
}

impl HttpCollector {
    /// Create a collector POSTing to `{endpoint}{track_path}`.
    pub fn new(
        endpoint: impl Into<String>,
        track_path: &str,
        timeout: Duration,
    ) -> Result<Self, CollectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectorError::Unavailable(format!("HTTP client: {e}")))?;

        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            track_url: format!("{endpoint}{track_path}"),
            endpoint,
            client,
        })
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, CollectorError> {
        Self::new(&config.endpoint, &config.track_path, config.request_timeout())
    }

    /// The URL events are POSTed to.
    pub fn track_url(&self) -> &str {
        &self.track_url
    }
}

#[async_trait]
impl Collector for HttpCollector {
    fn name(&self) -> &str {
        "http"
    }

    fn submit(&self, payload: &TrackPayload) -> Result<Delivery, CollectorError> {
        let request = self
            .client
            .post(&self.track_url)
            .json(payload)
            .build()
            .map_err(|e| CollectorError::Request(e.to_string()))?;

        debug!(url = %self.track_url, event = %payload.kind(), "Issuing collector request");

        let client = self.client.clone();
        Ok(Box::pin(async move {
            let response = client
                .execute(request)
                .await
                .map_err(|e| CollectorError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), body = %body, "Collector returned error");
                return Err(CollectorError::Status {
                    status_code: status.as_u16(),
                    body,
                });
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| CollectorError::MalformedResponse(e.to_string()))?;

            Ok(Ack {
                status: status.as_u16(),
                body,
            })
        }))
    }

    async fn health_check(&self) -> Result<bool, CollectorError> {
        // Any HTTP answer means the collector is reachable.
        self.client
            .get(&self.endpoint)
            .send()
            .await
            .map(|_| true)
            .map_err(|e| CollectorError::Network(e.to_string()))
    }
}
