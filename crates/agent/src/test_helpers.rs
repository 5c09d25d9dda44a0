//! Shared test helpers for tracker tests.

use pagetrack_core::collector::{Collector, Delivery};
use pagetrack_core::command::Command;
use pagetrack_core::error::CollectorError;
use pagetrack_core::event::{Ack, TrackPayload};
use pagetrack_core::notifier::{LogRecord, Notifier};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;

use crate::tracker::Tracker;

/// What the next submit does.
pub enum Scripted {
    /// Acknowledge the delivery.
    Deliver,
    /// Fail the delivery in transit.
    Fail,
    /// Refuse to issue the request at all.
    Fault,
    /// Fail the delivery once the gate is notified.
    FailWhen(Arc<Notify>),
    /// Fail the delivery after a delay.
    FailAfter(Duration),
    /// Block the submitting thread, then deliver.
    StallSubmit(Duration),
}

/// A collector that follows a script, one step per submit. Once the script
/// runs out every delivery succeeds.
#[derive(Default)]
pub struct ScriptedCollector {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TrackPayload>>,
    submits: Mutex<usize>,
}

impl ScriptedCollector {
    pub fn with_script(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Payloads of every issued request, in issue order.
    pub fn requests(&self) -> Vec<TrackPayload> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of submit calls, faulted ones included.
    pub fn submits(&self) -> usize {
        *self.submits.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Collector for ScriptedCollector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn submit(&self, payload: &TrackPayload) -> Result<Delivery, CollectorError> {
        *self.submits.lock().unwrap() += 1;
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Deliver);

        match step {
            Scripted::Fault => return Err(CollectorError::Request("scripted fault".into())),
            Scripted::StallSubmit(pause) => std::thread::sleep(pause),
            _ => {}
        }
        self.requests.lock().unwrap().push(payload.clone());

        Ok(Box::pin(async move {
            match step {
                Scripted::Deliver | Scripted::StallSubmit(_) => Ok(Ack {
                    status: 200,
                    body: json!({"ok": true}),
                }),
                Scripted::FailWhen(gate) => {
                    gate.notified().await;
                    Err(CollectorError::Network("connection reset".into()))
                }
                Scripted::FailAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Err(CollectorError::Network("timed out".into()))
                }
                _ => Err(CollectorError::Status {
                    status_code: 500,
                    body: "scripted failure".into(),
                }),
            }
        }))
    }
}

/// Keeps every diagnostic message it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// Appends one command to the bound tracker from inside the first
/// diagnostic call it sees after binding.
pub struct ReentrantNotifier {
    tracker: OnceLock<Tracker>,
    command: Mutex<Option<Command>>,
}

impl ReentrantNotifier {
    pub fn new(command: Command) -> Self {
        Self {
            tracker: OnceLock::new(),
            command: Mutex::new(Some(command)),
        }
    }

    pub fn bind(&self, tracker: Tracker) {
        let _ = self.tracker.set(tracker);
    }
}

impl Notifier for ReentrantNotifier {
    fn notify(&self, _record: LogRecord) {
        let Some(tracker) = self.tracker.get() else {
            return;
        };
        let command = self.command.lock().unwrap().take();
        if let Some(command) = command {
            tracker.push(command);
        }
    }
}
