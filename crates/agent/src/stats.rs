//! Delivery counters for a tracker session.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free running totals, updated from the drain loop and delivery tasks.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    issued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    deferred: AtomicU64,
    rejected: AtomicU64,
    discarded: AtomicU64,
    abandoned: AtomicU64,
}

/// A point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Requests handed to the collector.
    pub issued: u64,
    /// Requests acknowledged by the collector.
    pub delivered: u64,
    /// Requests that failed in transit.
    pub failed: u64,
    /// Failed deliveries re-enqueued.
    pub retried: u64,
    /// Commands deferred after a handler fault.
    pub deferred: u64,
    /// Commands rejected by validation (incl. malformed wire commands).
    pub rejected: u64,
    /// Commands with an unknown method.
    pub discarded: u64,
    /// Commands dropped after exhausting the retry policy.
    pub abandoned: u64,
}

impl DeliveryStats {
    pub fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retried(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}
