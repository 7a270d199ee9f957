// src/engine/mod.rs

//! Orchestration engine for commander.
//!
//! This module ties together:
//! - the queue store (Waiting / Done / Error / Dead plus the overall state)
//! - the retry policy and dead-letter sweep
//! - the main runtime event loop that reacts to:
//!   - submissions, replays and flushes coming from the [`Commander`] handle
//!   - command completions coming from the executor
//!   - stop requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`], and snapshot publication in [`publish`].
//!
//! [`Commander`]: crate::commander::Commander

use tokio::sync::oneshot;

use crate::command::Command;
use crate::config::CommanderConfig;
use crate::errors::Result;

/// Result of running a command's capability once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Capability resolved; carries its optional output.
    Success(Option<String>),
    /// Capability failed; carries the rendered error.
    Failed(String),
}

/// Events flowing into the runtime from the handle and the executor.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// Set the retry budget and (the first time) start processing.
    Initialized { config: CommanderConfig },
    /// A new command was submitted.
    CommandSubmitted { command: Command },
    /// Move everything in Error back to Waiting.
    ReplayRequested,
    /// Drop everything in Dead.
    FlushDeadRequested,
    /// The in-flight command finished.
    CommandCompleted {
        command: Command,
        outcome: CommandOutcome,
    },
    /// The executor could not accept the command handed to it.
    DispatchFailed { command: Command, reason: String },
    /// Stop dequeuing; exit once nothing is in flight.
    StopRequested,
}

/// Envelope carried on the runtime channel.
///
/// Requests from the handle carry an `ack` that is fired once the runtime
/// has applied the event, so callers observe their own mutation. The ack is
/// `Err(CommanderError::Stopped)` when the request was refused.
#[derive(Debug)]
pub struct RuntimeMessage {
    pub event: RuntimeEvent,
    pub ack: Option<oneshot::Sender<Result<()>>>,
}

impl From<RuntimeEvent> for RuntimeMessage {
    fn from(event: RuntimeEvent) -> Self {
        Self { event, ack: None }
    }
}

pub mod core;
pub mod event_handlers;
pub mod publish;
pub mod retry;
pub mod runtime;
pub mod store;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep, PipelinePhase};
pub use publish::{ViewPublisher, Views};
pub use retry::RetryPolicy;
pub use runtime::Runtime;
pub use store::QueueStore;
