// src/engine/retry.rs

//! Retry budget and the dead-letter sweep.

use tracing::warn;

use crate::command::{CommandEventType, CommandId, Ledger};
use crate::engine::store::QueueStore;

/// Decides from a ledger whether a command has used up its retries.
///
/// Only FAIL events count, across the whole lifetime of the command
/// (including earlier replays). START/RESTART/SUCCESS are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_number_of_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_number_of_retries: u32) -> Self {
        Self {
            max_number_of_retries,
        }
    }

    pub fn max_number_of_retries(&self) -> u32 {
        self.max_number_of_retries
    }

    pub fn is_exhausted(&self, ledger: &Ledger) -> bool {
        let fails = ledger.count(CommandEventType::Fail);
        fails > self.max_number_of_retries as usize
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_NUMBER_OF_RETRIES)
    }
}

/// Move every exhausted command from Error to Dead, appending one DEAD event
/// to each. Returns the ids that were moved, in Error order.
///
/// Commands already in Dead are never looked at again, so running the sweep
/// twice without a new failure moves nothing the second time.
pub fn sweep(store: &mut QueueStore, policy: &RetryPolicy) -> Vec<CommandId> {
    let mut moved = Vec::new();

    store.dead_letter_where(
        |command| policy.is_exhausted(command.ledger()),
        |command| {
            let fails = command.ledger().count(CommandEventType::Fail);
            warn!(
                command = %command.id(),
                fails,
                max_retries = policy.max_number_of_retries(),
                "retry budget exhausted; moving command to dead-letter queue"
            );
            command.record(CommandEventType::Dead, None);
            moved.push(command.id().to_string());
        },
    );

    moved
}
