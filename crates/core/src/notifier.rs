//! Best-effort diagnostic side channel.
//!
//! A [`Notifier`] mirrors agent log lines somewhere else (typically a remote
//! `/js-log` endpoint). It is fire-and-forget: implementations must not block,
//! must not panic, and swallow their own failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One mirrored log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub args: Value,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(message: impl Into<String>, args: Value) -> Self {
        Self {
            message: message.into(),
            args,
            timestamp: Utc::now(),
        }
    }
}

/// Receives diagnostic records.
pub trait Notifier: Send + Sync {
    fn notify(&self, record: LogRecord);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _record: LogRecord) {}
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&crate::event::format_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
