//! The tracker handle — the host-facing append hook.
//!
//! Every append runs a drain cycle synchronously unless one is already
//! running, in which case the running cycle picks the new commands up.
//! Nothing here ever returns an error to the host: malformed input and
//! delivery problems are absorbed and only show up in diagnostics and stats.

use pagetrack_collector::{HttpCollector, HttpLogSink};
use pagetrack_config::TrackerConfig;
use pagetrack_core::collector::Collector;
use pagetrack_core::command::Command;
use pagetrack_core::error::CollectorError;
use pagetrack_core::identity::IdentityContext;
use pagetrack_core::notifier::{NoopNotifier, Notifier};
use pagetrack_core::retry::RetryPolicy;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::diagnostics::Diagnostics;
use crate::dispatcher::run_cycle;
use crate::queue::CommandQueue;
use crate::seed::{ElementAttributes, product_seed};
use crate::sender::EventSender;
use crate::session::Session;
use crate::stats::{DeliveryStats, StatsSnapshot};

/// A live tracking session. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

struct Inner {
    session: Session,
    sender: EventSender,
    diagnostics: Diagnostics,
    stats: DeliveryStats,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Configures a tracker before it takes over the host buffer.
pub struct TrackerBuilder {
    collector: Arc<dyn Collector>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl TrackerBuilder {
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        Self {
            collector,
            notifier: Arc::new(NoopNotifier),
            retry: RetryPolicy::unbounded(),
        }
    }

    /// Where diagnostic messages are mirrored.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Take over `buffer`, drain it once, and return the live tracker.
    ///
    /// Commands in the buffer are processed exactly once; appends made
    /// through the returned handle trigger their own cycles.
    pub fn attach(self, buffer: CommandQueue) -> Tracker {
        let tracker = Tracker {
            inner: Arc::new(Inner {
                session: Session::new(buffer),
                sender: EventSender::new(self.collector, self.retry),
                diagnostics: Diagnostics::new(self.notifier),
                stats: DeliveryStats::default(),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        };

        tracker.diagnostics().info(
            "Tracker attached",
            json!({
                "session": tracker.session().id(),
                "collector": tracker.sender().collector().name(),
                "pending": tracker.pending(),
            }),
        );

        if tracker.session().begin_cycle() {
            run_cycle(&tracker);
        }
        tracker
    }
}

impl Tracker {
    pub fn builder(collector: Arc<dyn Collector>) -> TrackerBuilder {
        TrackerBuilder::new(collector)
    }

    /// Attach to `buffer` using the HTTP collector (and, if enabled, the
    /// remote log sink) described by `config`.
    pub fn from_config(
        config: &TrackerConfig,
        buffer: CommandQueue,
    ) -> Result<Self, CollectorError> {
        let collector = Arc::new(HttpCollector::from_config(config)?);
        let mut builder = Self::builder(collector).retry_policy(config.retry.to_policy());
        if config.remote_log {
            builder = builder.notifier(Arc::new(HttpLogSink::from_config(config)?));
        }
        Ok(builder.attach(buffer))
    }

    /// Append a command and drain. Returns the queue length right after the
    /// append.
    pub fn push(&self, command: Command) -> usize {
        self.push_all([command])
    }

    /// Append several commands, then drain once.
    pub fn push_all(&self, commands: impl IntoIterator<Item = Command>) -> usize {
        let append = self.inner.session.append(commands);
        if append.start_cycle {
            run_cycle(self);
        }
        append.len
    }

    /// Append a wire-form command (`[method, ...args]`). Malformed input is
    /// logged and dropped.
    pub fn push_wire(&self, raw: &Value) -> usize {
        match Command::from_wire(raw) {
            Ok(command) => self.push(command),
            Err(e) => {
                self.diagnostics()
                    .warn("Ignoring malformed command", json!([raw, e.to_string()]));
                self.inner.stats.record_rejected();
                self.pending()
            }
        }
    }

    /// Seed a product event from host element attributes. Returns the queue
    /// length if a command was appended.
    pub fn seed<'a>(
        &self,
        elements: impl IntoIterator<Item = &'a ElementAttributes>,
        marker_attribute: &str,
    ) -> Option<usize> {
        let command = product_seed(elements, marker_attribute)?;
        Some(self.push(command))
    }

    /// The identity context as of now.
    pub fn identity(&self) -> IdentityContext {
        self.inner.session.identity()
    }

    /// Commands waiting in the queue (typically deferred ones).
    pub fn pending(&self) -> usize {
        self.inner.session.pending()
    }

    /// Deliveries issued but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.sender.retry_policy()
    }

    /// Wait until no delivery is in flight and no drain cycle is running.
    ///
    /// A retry re-appended while another thread is draining stays queued
    /// until that cycle reaches it. Deferred commands left pending do not count. With a collector that
    /// keeps failing under an unbounded policy this never returns; bound it
    /// with a timeout.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 && !self.inner.session.is_draining() {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn sender(&self) -> &EventSender {
        &self.inner.sender
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    pub(crate) fn counters(&self) -> &DeliveryStats {
        &self.inner.stats
    }

    pub(crate) fn begin_delivery(&self) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// Called once a drain cycle has released the loop.
    pub(crate) fn end_cycle(&self) {
        self.inner.idle.notify_waiters();
    }

    pub(crate) fn end_delivery(&self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("session", &self.inner.session.id())
            .field("pending", &self.pending())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
