//! Remote diagnostic sink — mirrors agent log lines to `{endpoint}/js-log`.
//!
//! Each record is POSTed on its own task. Nothing is awaited, retried, or
//! ordered, and failures only show up as local `debug` logs.

use pagetrack_config::TrackerConfig;
use pagetrack_core::error::CollectorError;
use pagetrack_core::notifier::{LogRecord, Notifier};
use std::time::Duration;
use tracing::debug;

/// Fire-and-forget HTTP notifier.
pub struct HttpLogSink {
    url: String,
    client: reqwest::Client,
}

impl HttpLogSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CollectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectorError::Unavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Build from the loaded configuration.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, CollectorError> {
        Self::new(config.log_url(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for HttpLogSink {
    fn notify(&self, record: LogRecord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(message = %record.message, "No runtime for remote log, dropping record");
            return;
        };

        let request = self.client.post(&self.url).json(&record);
        handle.spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = response.status().as_u16(), "Log sink refused record");
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Log sink unreachable"),
            }
        });
    }
}
