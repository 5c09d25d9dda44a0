//! Command queue — the ordered buffer of pending commands.
//!
//! A host can fill a `CommandQueue` before any tracker exists; nothing is
//! processed until the buffer is handed to [`crate::TrackerBuilder::attach`].

use pagetrack_core::command::Command;
use pagetrack_core::error::DispatchError;
use serde_json::Value;
use std::collections::VecDeque;

/// FIFO of commands awaiting dispatch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommandQueue {
    items: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail and return the new length.
    pub fn push(&mut self, command: Command) -> usize {
        self.items.push_back(command);
        self.items.len()
    }

    /// Append a wire-form command (`[method, ...args]`).
    pub fn push_wire(&mut self, raw: &Value) -> Result<usize, DispatchError> {
        Ok(self.push(Command::from_wire(raw)?))
    }

    /// Build a queue from a host buffer, keeping every well-formed entry in
    /// order and returning the errors for the rest.
    pub fn from_wire_buffer(raw: &[Value]) -> (Self, Vec<DispatchError>) {
        let mut queue = Self::new();
        let mut errors = Vec::new();
        for entry in raw {
            if let Err(e) = queue.push_wire(entry) {
                errors.push(e);
            }
        }
        (queue, errors)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.items.iter()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Command> {
        self.items.pop_front()
    }
}

impl Extend<Command> for CommandQueue {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl FromIterator<Command> for CommandQueue {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
