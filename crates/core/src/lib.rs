//! # pagetrack core
//!
//! Domain types, traits, and error definitions for the pagetrack event
//! tracking agent. This crate does no I/O — it defines the command model,
//! identity resolution, payload construction, and the seams (`Collector`,
//! `Notifier`) the other crates implement against.

pub mod collector;
pub mod command;
pub mod error;
pub mod event;
pub mod identity;
pub mod notifier;
pub mod retry;

// Re-export key types at crate root for ergonomics
pub use collector::{Collector, Delivery};
pub use command::{Command, Method};
pub use error::{CollectorError, DispatchError, Error, Result};
pub use event::{Ack, EventType, TrackEvent, TrackPayload};
pub use identity::{AccountArg, IdentityContext};
pub use notifier::{LogRecord, NoopNotifier, Notifier};
pub use retry::RetryPolicy;
