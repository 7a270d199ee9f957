// src/command/ledger.rs

//! Append-only lifecycle history of a single command.

use std::fmt;

use chrono::{DateTime, Utc};

use super::CommandId;

/// Lifecycle transitions recorded in a command's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandEventType {
    Start,
    Success,
    Fail,
    Restart,
    Dead,
}

impl fmt::Display for CommandEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandEventType::Start => "start",
            CommandEventType::Success => "success",
            CommandEventType::Fail => "fail",
            CommandEventType::Restart => "restart",
            CommandEventType::Dead => "dead",
        };
        f.write_str(s)
    }
}

/// One immutable entry in a ledger.
///
/// `command_id` only correlates the event with its command; it does not own
/// anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub kind: CommandEventType,
    pub timestamp: DateTime<Utc>,
    pub command_id: CommandId,
    pub data: Option<String>,
}

/// Chronological event history. Entries can be appended but never removed
/// or rewritten.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    events: Vec<CommandEvent>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new event stamped with the current time.
    pub fn record(&mut self, command_id: &str, kind: CommandEventType, data: Option<String>) {
        self.events.push(CommandEvent {
            kind,
            timestamp: Utc::now(),
            command_id: command_id.to_string(),
            data,
        });
    }

    /// Number of events of the given kind over the whole lifetime.
    pub fn count(&self, kind: CommandEventType) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn last(&self) -> Option<&CommandEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[CommandEvent] {
        &self.events
    }
}
