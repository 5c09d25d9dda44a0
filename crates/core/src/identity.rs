//! Identity context — who outgoing events are attributed to.
//!
//! Resolution of the `setAccount` argument follows three shapes:
//!
//! 1. **Identifier** — a non-empty string binds user and account to it
//! 2. **Profile** — an object with `id`/`userId` and/or `email` keys
//! 3. **Invalid** — anything else resets user and email to sentinels but
//!    leaves the account untouched
//!
//! Every field is always a non-empty string; missing data falls back to a
//! fixed sentinel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account used before any `setAccount`, and for profiles without an email.
pub const DEFAULT_ACCOUNT: &str = "default_email";
/// User identifier placeholder.
pub const UNKNOWN_ID: &str = "unknown_id";
/// Email placeholder.
pub const UNKNOWN_EMAIL: &str = "unknown_email";

/// Keys read from a profile object, in priority order.
const IDENTIFIER_KEYS: &[&str] = &["id", "userId"];
const EMAIL_KEY: &str = "email";

/// The account/user/email triple used to enrich outgoing events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub account_id: String,
    pub user_id: String,
    pub email: String,
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT.into(),
            user_id: UNKNOWN_ID.into(),
            email: UNKNOWN_EMAIL.into(),
        }
    }
}

/// The argument of a `setAccount` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountArg {
    ByIdentifier(String),
    ByProfile {
        identifier: Option<String>,
        email: Option<String>,
    },
    Invalid,
}

impl AccountArg {
    /// Classify a raw command argument.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => Self::ByIdentifier(s.clone()),
            Some(Value::Object(map)) => {
                let has_keys = IDENTIFIER_KEYS.iter().any(|k| map.contains_key(*k))
                    || map.contains_key(EMAIL_KEY);
                if !has_keys {
                    return Self::Invalid;
                }
                let identifier = IDENTIFIER_KEYS
                    .iter()
                    .find_map(|k| map.get(*k).and_then(non_empty_text));
                let email = map.get(EMAIL_KEY).and_then(non_empty_text);
                Self::ByProfile { identifier, email }
            }
            _ => Self::Invalid,
        }
    }
}

/// Strings and numbers count as text; empty strings do not.
fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl IdentityContext {
    /// Apply a `setAccount` argument. Never fails.
    pub fn apply(&mut self, arg: &AccountArg) {
        match arg {
            AccountArg::ByIdentifier(id) => {
                self.user_id = id.clone();
                self.account_id = id.clone();
                self.email = UNKNOWN_EMAIL.into();
            }
            AccountArg::ByProfile { identifier, email } => {
                self.user_id = identifier.clone().unwrap_or_else(|| UNKNOWN_ID.into());
                self.email = email.clone().unwrap_or_else(|| UNKNOWN_EMAIL.into());
                self.account_id = email.clone().unwrap_or_else(|| DEFAULT_ACCOUNT.into());
            }
            // account_id deliberately keeps its previous value here
            AccountArg::Invalid => {
                self.user_id = UNKNOWN_ID.into();
                self.email = UNKNOWN_EMAIL.into();
            }
        }
    }

    /// Whether every field carries a value.
    pub fn is_complete(&self) -> bool {
        !self.account_id.is_empty() && !self.user_id.is_empty() && !self.email.is_empty()
    }
}
