//! Diagnostic logging: local `tracing` output mirrored to a [`Notifier`].

use pagetrack_core::notifier::{LogRecord, Notifier};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Diagnostics {
    notifier: Arc<dyn Notifier>,
}

impl Diagnostics {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn debug(&self, message: &str, args: Value) {
        debug!(target: "pagetrack", args = %args, "{message}");
        self.mirror(message, args);
    }

    pub fn info(&self, message: &str, args: Value) {
        info!(target: "pagetrack", args = %args, "{message}");
        self.mirror(message, args);
    }

    pub fn warn(&self, message: &str, args: Value) {
        warn!(target: "pagetrack", args = %args, "{message}");
        self.mirror(message, args);
    }

    fn mirror(&self, message: &str, args: Value) {
        self.notifier.notify(LogRecord::new(message, args));
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
