//! Event sender — turns a track command into a collector request.
//!
//! The synchronous part (validation, payload construction, issuing the
//! request) runs inside the drain cycle. The outcome is handled on a spawned
//! task: an acknowledgment is logged, a failure re-appends a fresh copy of
//! the original command so the retry picks up the identity as of the retry.

use chrono::Utc;
use pagetrack_core::collector::Collector;
use pagetrack_core::command::Command;
use pagetrack_core::error::DispatchError;
use pagetrack_core::event::{EventType, TrackEvent};
use pagetrack_core::retry::RetryPolicy;
use serde_json::json;
use std::sync::Arc;

use crate::dispatcher::Outcome;
use crate::tracker::Tracker;

/// Sends track events through a [`Collector`].
pub struct EventSender {
    collector: Arc<dyn Collector>,
    retry: RetryPolicy,
}

impl EventSender {
    pub fn new(collector: Arc<dyn Collector>, retry: RetryPolicy) -> Self {
        Self { collector, retry }
    }

    pub fn collector(&self) -> &Arc<dyn Collector> {
        &self.collector
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Validate, enrich, and issue `command` as an event of type `kind`.
    pub(crate) fn send(
        &self,
        tracker: &Tracker,
        command: &Command,
        kind: EventType,
    ) -> Result<Outcome, DispatchError> {
        let event = TrackEvent::from_arg(kind, command.first_arg())?;
        event.validate()?;

        let fault = |reason: String| DispatchError::Fault {
            method: command.method().to_string(),
            reason,
        };

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| fault(format!("no async runtime to deliver on: {e}")))?;

        let identity = tracker.session().identity();
        let payload = event.into_payload(&identity, Utc::now());
        tracker.diagnostics().info(
            "Sending event",
            serde_json::to_value(&payload).unwrap_or_default(),
        );

        let delivery = self
            .collector
            .submit(&payload)
            .map_err(|e| fault(e.to_string()))?;
        tracker.counters().record_issued();
        tracker.begin_delivery();

        let handle = tracker.clone();
        let command = command.clone();
        let retry = self.retry;
        runtime.spawn(async move {
            match delivery.await {
                Ok(ack) => {
                    handle.counters().record_delivered();
                    handle.diagnostics().info("Server response", ack.body);
                }
                Err(e) if retry.allows_retry(command.attempt()) => {
                    handle.counters().record_failed();
                    handle.diagnostics().warn(
                        "Tracking error, will retry",
                        json!([command.method().as_str(), e.to_string()]),
                    );
                    if !retry.backoff.is_zero() {
                        tokio::time::sleep(retry.backoff).await;
                    }
                    handle.counters().record_retried();
                    handle.push(command.retry());
                }
                Err(e) => {
                    handle.counters().record_failed();
                    handle.counters().record_abandoned();
                    handle.diagnostics().warn(
                        "Tracking error, giving up",
                        json!([command.method().as_str(), command.attempt() + 1, e.to_string()]),
                    );
                }
            }
            handle.end_delivery();
        });

        Ok(Outcome::Issued(kind))
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("collector", &self.collector.name())
            .field("retry", &self.retry)
            .finish()
    }
}
