//! Tracked events and the payloads sent to the collector.
//!
//! An event is built transiently when a track command is dispatched: the
//! command's data mapping is merged over the generated fields
//! (`type`, `account`, `userId`, `email`, `timestamp`).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::Method;
use crate::error::DispatchError;
use crate::identity::IdentityContext;

/// The kinds of behavioral event the agent forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Product,
    PageView,
    Cart,
    Login,
}

impl EventType {
    /// The track method that produces this event type.
    pub fn method(self) -> Method {
        match self {
            Self::Product => Method::TrackProduct,
            Self::PageView => Method::TrackPageView,
            Self::Cart => Method::TrackCart,
            Self::Login => Method::TrackLogin,
        }
    }

    /// Data fields that must be present and non-empty.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Product => &["id"],
            Self::PageView | Self::Cart | Self::Login => &[],
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::PageView => write!(f, "page_view"),
            Self::Cart => write!(f, "cart"),
            Self::Login => write!(f, "login"),
        }
    }
}

/// An event before enrichment: its type and the host-provided fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    pub kind: EventType,
    pub data: Map<String, Value>,
}

impl TrackEvent {
    /// Build an event from a track command's first argument.
    ///
    /// A missing or `null` argument means no fields. Anything other than an
    /// object is rejected.
    pub fn from_arg(kind: EventType, arg: Option<&Value>) -> Result<Self, DispatchError> {
        let data = match arg {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(DispatchError::Rejected {
                    event: kind,
                    reason: format!("event data must be an object, got {other}"),
                });
            }
        };
        Ok(Self { kind, data })
    }

    /// Check the mandatory fields for this event type.
    pub fn validate(&self) -> Result<(), DispatchError> {
        for field in self.kind.required_fields() {
            let present = match self.data.get(*field) {
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Number(_)) => true,
                _ => false,
            };
            if !present {
                return Err(DispatchError::Rejected {
                    event: self.kind,
                    reason: format!("missing required field `{field}`"),
                });
            }
        }
        Ok(())
    }

    /// Merge the event over the generated fields. Event data wins on
    /// key collisions.
    pub fn into_payload(self, identity: &IdentityContext, at: DateTime<Utc>) -> TrackPayload {
        let mut body = Map::new();
        body.insert("type".into(), Value::String(self.kind.to_string()));
        body.insert("account".into(), Value::String(identity.account_id.clone()));
        body.insert("userId".into(), Value::String(identity.user_id.clone()));
        body.insert("email".into(), Value::String(identity.email.clone()));
        body.insert("timestamp".into(), Value::String(format_timestamp(at)));
        body.extend(self.data);
        TrackPayload { kind: self.kind, body }
    }
}

/// Render an instant as sortable ISO-8601 UTC with milliseconds, e.g.
/// `2025-03-01T12:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The JSON body POSTed to the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPayload {
    #[serde(skip)]
    kind: EventType,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl TrackPayload {
    pub fn kind(&self) -> EventType {
        self.kind
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Convenience accessor for string fields.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

/// The collector's acknowledgment of a delivered payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    /// HTTP status (or an adapter-specific code for non-HTTP collectors).
    pub status: u16,
    /// The parsed response body.
    pub body: Value,
}
