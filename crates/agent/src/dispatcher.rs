//! The drain loop — interprets queued commands until the queue is empty.
//!
//! Each cycle:
//!
//! 1. **Pop** the head command
//! 2. **Dispatch** it: `setAccount` mutates the identity context, track
//!    methods go to the [`crate::sender::EventSender`], anything else is
//!    discarded
//! 3. **Defer** it if the handler faulted
//! 4. Once the queue is empty, **merge** deferred commands back onto the tail
//!    in their original order, without starting another cycle
//!
//! A deferred command therefore runs again only when a later append starts a
//! new cycle.

use pagetrack_core::command::{Command, Method};
use pagetrack_core::error::DispatchError;
use pagetrack_core::event::EventType;
use pagetrack_core::identity::{AccountArg, IdentityContext};
use serde_json::json;

use crate::tracker::Tracker;

/// What a successfully dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    IdentityUpdated(IdentityContext),
    Issued(EventType),
}

/// Summary of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub deferred: usize,
}

/// Run a drain cycle. The caller must have claimed the drain loop.
pub(crate) fn run_cycle(tracker: &Tracker) -> CycleReport {
    let diagnostics = tracker.diagnostics();
    let stats = tracker.counters();
    let mut deferred: Vec<Command> = Vec::new();
    let mut report = CycleReport::default();

    while let Some(command) = tracker.session().next(&mut deferred) {
        report.processed += 1;
        diagnostics.debug("Processing queue item", command.to_wire());

        match dispatch(tracker, &command) {
            Ok(outcome) => {
                tracing::trace!(method = %command.method(), ?outcome, "Command dispatched");
            }
            Err(err) if err.is_retryable() => {
                if tracker.retry_policy().allows_retry(command.attempt()) {
                    diagnostics.warn(
                        "Error processing queue item, will retry",
                        json!([command.method().as_str(), err.to_string()]),
                    );
                    stats.record_deferred();
                    deferred.push(command.retry());
                    report.deferred += 1;
                } else {
                    diagnostics.warn(
                        "Giving up on queue item",
                        json!([command.method().as_str(), command.attempt() + 1, err.to_string()]),
                    );
                    stats.record_abandoned();
                }
            }
            Err(DispatchError::UnknownMethod(name)) => {
                diagnostics.warn("Unknown method", json!([name]));
                stats.record_discarded();
            }
            Err(err) => {
                diagnostics.warn("Dropping queue item", json!([command.to_wire(), err.to_string()]));
                stats.record_rejected();
            }
        }
    }

    tracker.end_cycle();

    if report.processed > 0 {
        tracing::debug!(
            session = %tracker.session().id(),
            processed = report.processed,
            deferred = report.deferred,
            "Drain cycle complete"
        );
    }
    report
}

/// Route one command to its handler.
fn dispatch(tracker: &Tracker, command: &Command) -> Result<Outcome, DispatchError> {
    if *command.method() == Method::SetAccount {
        let arg = AccountArg::from_value(command.first_arg());
        if arg == AccountArg::Invalid {
            tracker
                .diagnostics()
                .warn("Invalid account argument, resetting user", command.to_wire());
        }
        let identity = tracker.session().set_account(&arg);
        tracker
            .diagnostics()
            .info("Account set to", json!([identity.account_id]));
        return Ok(Outcome::IdentityUpdated(identity));
    }

    match command.method().event_type() {
        Some(kind) => tracker.sender().send(tracker, command, kind),
        None => Err(DispatchError::UnknownMethod(command.method().to_string())),
    }
}
