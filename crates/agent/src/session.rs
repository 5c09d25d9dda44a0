//! Session — the queue and identity context shared by one tracker.
//!
//! All state sits behind a single mutex that is only held for queue and
//! identity bookkeeping, never while a command is being dispatched. The
//! `draining` flag is what makes append re-entrant: it is claimed and
//! released under the same lock as the empty-queue check, so an append
//! either starts a cycle or is guaranteed to be seen by the running one.

use chrono::{DateTime, Utc};
use pagetrack_core::command::Command;
use pagetrack_core::identity::{AccountArg, IdentityContext};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::queue::CommandQueue;

/// Session-scoped state owned by a tracker.
#[derive(Debug)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    queue: CommandQueue,
    identity: IdentityContext,
    draining: bool,
}

/// Result of appending to the session queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Append {
    /// Queue length right after the append.
    pub len: usize,
    /// The caller claimed the drain loop and must run it.
    pub start_cycle: bool,
}

impl Session {
    /// Start a session that takes over an existing host buffer.
    pub(crate) fn new(buffer: CommandQueue) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            state: Mutex::new(SessionState {
                queue: buffer,
                ..SessionState::default()
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// A copy of the identity context as of now.
    pub fn identity(&self) -> IdentityContext {
        self.lock().identity.clone()
    }

    /// Commands waiting in the queue.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Whether a drain cycle is currently running.
    pub fn is_draining(&self) -> bool {
        self.lock().draining
    }

    /// Apply a `setAccount` argument and return the resulting identity.
    pub(crate) fn set_account(&self, arg: &AccountArg) -> IdentityContext {
        let mut state = self.lock();
        state.identity.apply(arg);
        state.identity.clone()
    }

    /// Append commands to the tail. Claims the drain loop if nobody holds it.
    pub(crate) fn append(&self, commands: impl IntoIterator<Item = Command>) -> Append {
        let mut state = self.lock();
        state.queue.extend(commands);
        let start_cycle = !state.draining;
        state.draining = true;
        Append {
            len: state.queue.len(),
            start_cycle,
        }
    }

    /// Claim the drain loop without appending. Returns false if a cycle is
    /// already running.
    pub(crate) fn begin_cycle(&self) -> bool {
        let mut state = self.lock();
        if state.draining {
            return false;
        }
        state.draining = true;
        true
    }

    /// Pop the head command. Once the queue is empty, moves `deferred` to
    /// the tail, releases the drain loop, and returns `None`.
    pub(crate) fn next(&self, deferred: &mut Vec<Command>) -> Option<Command> {
        let mut state = self.lock();
        if let Some(command) = state.queue.pop_front() {
            return Some(command);
        }
        state.queue.extend(deferred.drain(..));
        state.draining = false;
        None
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
