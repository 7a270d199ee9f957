// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state (queues, orchestrator state, retry budget)
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the runtime channel
//! - handing dispatched commands to the executor
//! - publishing snapshots and faults
//!
//! The core is intended to be extensively tested without any Tokio,
//! channels, or real command execution.
//!
//! [`CoreCommand`]: crate::engine::CoreCommand

use crate::command::CommandSnapshot;
use crate::engine::event_handlers::{
    handle_completion, handle_dispatch_failure, handle_flush_dead, handle_init,
    handle_replay, handle_stop, handle_submission, CoreStep, PipelinePhase, PipelineStatus,
};
use crate::engine::retry::RetryPolicy;
use crate::engine::store::QueueStore;
use crate::engine::RuntimeEvent;
use crate::types::{CommanderState, QueueKind};

/// Pure core runtime state.
///
/// This owns:
/// - the queue store
/// - the retry policy currently in effect
/// - the pipeline phase and in-flight marker
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug, Default)]
pub struct CoreRuntime {
    store: QueueStore,
    policy: RetryPolicy,
    pipeline: PipelineStatus,
}

impl CoreRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CommanderState {
        self.store.state()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.pipeline.phase
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Id of the command currently held by the executor.
    pub fn in_flight(&self) -> Option<&str> {
        self.pipeline.in_flight.as_ref().map(|current| current.id.as_str())
    }

    pub fn snapshot(&self, kind: QueueKind) -> Vec<CommandSnapshot> {
        self.store.snapshot(kind)
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.store.len(kind)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::Initialized { config } => {
                handle_init(&mut self.store, &mut self.pipeline, &mut self.policy, config)
            }
            RuntimeEvent::CommandSubmitted { command } => {
                handle_submission(&mut self.store, &mut self.pipeline, command)
            }
            RuntimeEvent::ReplayRequested => handle_replay(&mut self.store, &mut self.pipeline),
            RuntimeEvent::FlushDeadRequested => handle_flush_dead(&mut self.store, &self.pipeline),
            RuntimeEvent::CommandCompleted { command, outcome } => handle_completion(
                &mut self.store,
                &mut self.pipeline,
                &self.policy,
                command,
                outcome,
            ),
            RuntimeEvent::DispatchFailed { command, reason } => handle_dispatch_failure(
                &mut self.store,
                &mut self.pipeline,
                &self.policy,
                command,
                reason,
            ),
            RuntimeEvent::StopRequested => handle_stop(&mut self.store, &mut self.pipeline),
        }
    }
}
