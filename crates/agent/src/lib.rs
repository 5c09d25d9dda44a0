//! The tracking engine — the heart of pagetrack.
//!
//! A host pushes commands onto a queue, possibly before the tracker exists.
//! Attaching a [`Tracker`] takes the queue over:
//!
//! 1. **Drain** whatever the host buffered, in order
//! 2. **Intercept** every later append and drain synchronously
//! 3. **Dispatch** each command: identity updates, tracked events, or discard
//! 4. **Deliver** events to the collector asynchronously, re-appending on failure
//!
//! The drain loop is re-entrant: an append made while a cycle is running is
//! consumed by that cycle instead of starting a nested one.

pub mod diagnostics;
mod dispatcher;
pub mod queue;
pub mod seed;
mod sender;
pub mod session;
pub mod stats;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use diagnostics::Diagnostics;
pub use queue::CommandQueue;
pub use seed::{DEFAULT_MARKER, ElementAttributes, product_seed};
pub use session::Session;
pub use stats::{DeliveryStats, StatsSnapshot};
pub use tracker::{Tracker, TrackerBuilder};
