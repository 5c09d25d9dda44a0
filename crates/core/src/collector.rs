//! Collector trait — the abstraction over the remote event sink.
//!
//! Submitting is split in two: [`Collector::submit`] synchronously issues the
//! request and hands back a [`Delivery`] future; awaiting that future yields
//! the acknowledgment. An error from `submit` means the request never left,
//! an error from the future means it was lost or refused on the way.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::CollectorError;
use crate::event::{Ack, TrackPayload};

/// An issued, not yet settled, delivery.
pub type Delivery = BoxFuture<'static, Result<Ack, CollectorError>>;

/// The core Collector trait.
///
/// Implementations handle transport, encoding, and response parsing.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Human-readable name (e.g. "http").
    fn name(&self) -> &str;

    /// Issue a delivery for `payload`.
    fn submit(&self, payload: &TrackPayload) -> Result<Delivery, CollectorError>;

    /// Check whether the collector is reachable.
    async fn health_check(&self) -> Result<bool, CollectorError> {
        Ok(true)
    }
}
