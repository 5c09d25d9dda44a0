//! Retry policy for failed deliveries and deferred commands.

use std::time::Duration;

/// How often, and how eagerly, a failing command is re-enqueued.
///
/// The default retries forever with no delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first. `None` = unlimited.
    pub max_attempts: Option<u32>,
    /// Delay before a failed delivery is re-enqueued.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry forever, immediately.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Allow at most `max_attempts` tries in total.
    pub fn limited(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: Duration::ZERO,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether a command that just failed on `attempt` (zero-based) may be
    /// tried again.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => attempt.saturating_add(1) < max,
        }
    }
}
