// src/engine/store.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::command::{Command, CommandSnapshot};
use crate::types::{CommanderState, QueueKind};

/// The four command collections plus the orchestrator state.
///
/// Semantics:
/// - `waiting` is FIFO: submissions and replay batches go to the back, the
///   pipeline pops from the front.
/// - `done`, `error` and `dead` keep insertion (= completion) order.
/// - A command lives in exactly one collection. The only exception is the
///   in-flight command, which is owned by the executor until its outcome
///   comes back.
#[derive(Debug, Default)]
pub struct QueueStore {
    waiting: VecDeque<Command>,
    done: Vec<Command>,
    error: Vec<Command>,
    dead: Vec<Command>,
    state: CommanderState,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CommanderState {
        self.state
    }

    /// Returns `true` if the state actually changed.
    pub fn set_state(&mut self, state: CommanderState) -> bool {
        if self.state == state {
            return false;
        }
        debug!(from = %self.state, to = %state, "commander state transition");
        self.state = state;
        true
    }

    pub fn push_waiting(&mut self, command: Command) {
        self.waiting.push_back(command);
    }

    /// Append a batch to the back of Waiting, keeping the batch order.
    pub fn append_waiting(&mut self, batch: Vec<Command>) {
        self.waiting.extend(batch);
    }

    pub fn pop_waiting(&mut self) -> Option<Command> {
        self.waiting.pop_front()
    }

    pub fn push_done(&mut self, command: Command) {
        self.done.push(command);
    }

    pub fn push_error(&mut self, command: Command) {
        self.error.push(command);
    }

    /// Empty the Error queue and hand its contents back in order.
    pub fn take_errors(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.error)
    }

    /// Move every Error command matching `pred` to Dead, calling `on_move`
    /// on each one first. Relative order is preserved in both queues.
    pub fn dead_letter_where<P, F>(&mut self, mut pred: P, mut on_move: F) -> usize
    where
        P: FnMut(&Command) -> bool,
        F: FnMut(&mut Command),
    {
        let mut kept = Vec::with_capacity(self.error.len());
        let mut moved = 0;

        for mut command in self.error.drain(..) {
            if pred(&command) {
                on_move(&mut command);
                self.dead.push(command);
                moved += 1;
            } else {
                kept.push(command);
            }
        }

        self.error = kept;
        moved
    }

    /// Drop every dead command. Returns how many were released.
    pub fn clear_dead(&mut self) -> usize {
        let n = self.dead.len();
        self.dead.clear();
        n
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        match kind {
            QueueKind::Waiting => self.waiting.len(),
            QueueKind::Done => self.done.len(),
            QueueKind::Error => self.error.len(),
            QueueKind::Dead => self.dead.len(),
        }
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.len(kind) == 0
    }

    /// Ordered copy of the given queue.
    pub fn snapshot(&self, kind: QueueKind) -> Vec<CommandSnapshot> {
        match kind {
            QueueKind::Waiting => self.waiting.iter().map(Command::snapshot).collect(),
            QueueKind::Done => self.done.iter().map(Command::snapshot).collect(),
            QueueKind::Error => self.error.iter().map(Command::snapshot).collect(),
            QueueKind::Dead => self.dead.iter().map(Command::snapshot).collect(),
        }
    }
}
