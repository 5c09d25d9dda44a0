//! Commands — the unit of work hosts push onto the tracking queue.
//!
//! On the wire a command is a JSON array `[methodName, ...args]`, the same
//! shape a host page pushes onto its buffer before the agent loads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;
use crate::event::EventType;

/// The method tag of a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    SetAccount,
    TrackProduct,
    TrackPageView,
    TrackCart,
    TrackLogin,
    /// Any method name the agent does not handle. Discarded at dispatch.
    Unrecognized(String),
}

impl Method {
    /// Parse a wire method name. Never fails: unknown names are kept verbatim.
    pub fn parse(name: &str) -> Self {
        match name {
            "setAccount" => Self::SetAccount,
            "trackProduct" => Self::TrackProduct,
            "trackPageView" => Self::TrackPageView,
            "trackCart" => Self::TrackCart,
            "trackLogin" => Self::TrackLogin,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The wire name of this method.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SetAccount => "setAccount",
            Self::TrackProduct => "trackProduct",
            Self::TrackPageView => "trackPageView",
            Self::TrackCart => "trackCart",
            Self::TrackLogin => "trackLogin",
            Self::Unrecognized(name) => name,
        }
    }

    /// The event type a track method sends, if any.
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::TrackProduct => Some(EventType::Product),
            Self::TrackPageView => Some(EventType::PageView),
            Self::TrackCart => Some(EventType::Cart),
            Self::TrackLogin => Some(EventType::Login),
            Self::SetAccount | Self::Unrecognized(_) => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued command: a method tag plus its opaque arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Command {
    method: Method,
    args: Vec<Value>,
    /// Zero for the first try; bumped each time the command is re-enqueued.
    attempt: u32,
}

impl Command {
    pub fn new(method: Method, args: Vec<Value>) -> Self {
        Self {
            method,
            args,
            attempt: 0,
        }
    }

    /// `["setAccount", arg]`
    pub fn set_account(arg: impl Into<Value>) -> Self {
        Self::new(Method::SetAccount, vec![arg.into()])
    }

    /// A track command for the given event type carrying `data`.
    pub fn track(event: EventType, data: impl Into<Value>) -> Self {
        Self::new(event.method(), vec![data.into()])
    }

    /// Parse the wire form `[methodName, ...args]`.
    pub fn from_wire(raw: &Value) -> Result<Self, DispatchError> {
        let items = raw
            .as_array()
            .ok_or_else(|| DispatchError::Malformed(format!("expected an array, got {raw}")))?;
        let (head, args) = items
            .split_first()
            .ok_or_else(|| DispatchError::Malformed("empty command".into()))?;
        let name = head.as_str().ok_or_else(|| {
            DispatchError::Malformed(format!("method name must be a string, got {head}"))
        })?;
        Ok(Self::new(Method::parse(name), args.to_vec()))
    }

    /// Render the wire form `[methodName, ...args]`.
    pub fn to_wire(&self) -> Value {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Value::String(self.method.as_str().to_string()));
        items.extend(self.args.iter().cloned());
        Value::Array(items)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The first argument, if any.
    pub fn first_arg(&self) -> Option<&Value> {
        self.args.first()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// A fresh command with the same method and original arguments, one
    /// attempt further along.
    pub fn retry(&self) -> Self {
        Self {
            method: self.method.clone(),
            args: self.args.clone(),
            attempt: self.attempt.saturating_add(1),
        }
    }
}

impl TryFrom<Value> for Command {
    type Error = DispatchError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        Self::from_wire(&raw)
    }
}

impl From<Command> for Value {
    fn from(command: Command) -> Self {
        command.to_wire()
    }
}
