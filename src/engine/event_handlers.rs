// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandEventType, CommandId};
use crate::config::CommanderConfig;
use crate::engine::retry::{self, RetryPolicy};
use crate::engine::store::QueueStore;
use crate::engine::CommandOutcome;
use crate::errors::PipelineFault;
use crate::types::{CommanderState, QueueKind};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Hand this command to the executor.
    Dispatch(Command),
    /// Publish a fresh snapshot of the given queue.
    PublishQueue(QueueKind),
    /// Publish a state transition.
    PublishState(CommanderState),
    /// Report a pipeline fault to subscribers.
    ReportFault(PipelineFault),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
    /// The request was refused because the pipeline is stopping; the caller
    /// gets `CommanderError::Stopped`.
    pub rejected: bool,
}

impl CoreStep {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
            rejected: false,
        }
    }

    fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::new()
        }
    }

    fn publish_queue(&mut self, kind: QueueKind) {
        // Snapshots are taken after the whole step, so one per queue is enough.
        let already = self
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::PublishQueue(k) if *k == kind));
        if !already {
            self.commands.push(CoreCommand::PublishQueue(kind));
        }
    }
}

impl Default for CoreStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Constructed, `init` not called yet. Submissions are queued only.
    AwaitingInit,
    /// Dequeuing and executing.
    Running,
    /// `stop` was requested; no further dequeues.
    Stopping,
}

/// The command currently held by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub id: CommandId,
    /// Token stamped on the command at dispatch; only a completion carrying
    /// it settles this dispatch.
    pub token: u64,
}

/// Mutable pipeline bookkeeping owned by the core.
#[derive(Debug)]
pub struct PipelineStatus {
    pub phase: PipelinePhase,
    pub in_flight: Option<InFlight>,
    next_token: u64,
}

impl PipelineStatus {
    pub fn new() -> Self {
        Self {
            phase: PipelinePhase::AwaitingInit,
            in_flight: None,
            next_token: 0,
        }
    }

    /// Whether `command` is the one the executor was handed last.
    fn is_in_flight(&self, command: &Command) -> bool {
        match (&self.in_flight, command.dispatch_token()) {
            (Some(current), Some(token)) => current.token == token,
            _ => false,
        }
    }
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle `init`: install the retry budget, start the pipeline on first call.
pub fn handle_init(
    store: &mut QueueStore,
    pipeline: &mut PipelineStatus,
    policy: &mut RetryPolicy,
    config: CommanderConfig,
) -> CoreStep {
    if pipeline.phase == PipelinePhase::Stopping {
        warn!("init requested while stopping; rejected");
        return CoreStep::rejected();
    }

    let mut step = CoreStep::new();

    *policy = RetryPolicy::new(config.error.max_number_of_retries);
    info!(
        max_retries = policy.max_number_of_retries(),
        phase = ?pipeline.phase,
        "commander initialised"
    );

    if pipeline.phase == PipelinePhase::AwaitingInit {
        pipeline.phase = PipelinePhase::Running;
        dispatch_next(store, pipeline, &mut step);
    }

    step
}

/// Handle a submission.
///
/// The command always joins the back of Waiting. It is dispatched right
/// away only if nothing is in flight; otherwise it waits its turn and the
/// pipeline picks it up after the current command.
pub fn handle_submission(
    store: &mut QueueStore,
    pipeline: &mut PipelineStatus,
    command: Command,
) -> CoreStep {
    if pipeline.phase == PipelinePhase::Stopping {
        warn!(command = %command.id(), "command submitted while stopping; rejected");
        return CoreStep::rejected();
    }

    let mut step = CoreStep::new();

    debug!(
        command = %command.id(),
        waiting = store.len(QueueKind::Waiting),
        "command submitted"
    );
    store.push_waiting(command);
    step.publish_queue(QueueKind::Waiting);

    dispatch_next(store, pipeline, &mut step);
    step
}

/// Handle a replay request: the whole Error queue goes back to Waiting as one
/// batch, in order, each command getting a RESTART event.
///
/// An empty Error queue makes this a no-op: nothing is published and the
/// state does not change.
pub fn handle_replay(store: &mut QueueStore, pipeline: &mut PipelineStatus) -> CoreStep {
    if pipeline.phase == PipelinePhase::Stopping {
        warn!("replay requested while stopping; rejected");
        return CoreStep::rejected();
    }

    let mut step = CoreStep::new();

    let mut batch = store.take_errors();
    if batch.is_empty() {
        debug!("replay requested with empty error queue; nothing to do");
        return step;
    }

    for command in batch.iter_mut() {
        command.record(CommandEventType::Restart, None);
    }

    info!(count = batch.len(), "replaying commands in error");
    store.append_waiting(batch);
    step.publish_queue(QueueKind::Error);
    step.publish_queue(QueueKind::Waiting);

    dispatch_next(store, pipeline, &mut step);
    step
}

/// Handle a flush of the dead-letter queue.
pub fn handle_flush_dead(store: &mut QueueStore, pipeline: &PipelineStatus) -> CoreStep {
    if pipeline.phase == PipelinePhase::Stopping {
        warn!("flush requested while stopping; rejected");
        return CoreStep::rejected();
    }

    let mut step = CoreStep::new();

    let released = store.clear_dead();
    if released > 0 {
        info!(released, "flushed dead-letter queue");
        step.publish_queue(QueueKind::Dead);
    }

    step
}

/// Handle the outcome of the in-flight command.
pub fn handle_completion(
    store: &mut QueueStore,
    pipeline: &mut PipelineStatus,
    policy: &RetryPolicy,
    command: Command,
    outcome: CommandOutcome,
) -> CoreStep {
    let mut step = CoreStep::new();

    if pipeline.is_in_flight(&command) {
        pipeline.in_flight = None;
    } else {
        let fault = PipelineFault::UnexpectedCompletion {
            command: command.id().to_string(),
        };
        error!(error = %fault, "pipeline fault");
        step.commands.push(CoreCommand::ReportFault(fault));

        if pipeline.in_flight.is_some() {
            // The dispatched command is still running: record the stray
            // without touching the state or the pipeline.
            route_outcome(store, policy, command, outcome, &mut step);
            return step;
        }
    }

    let settled = route_outcome(store, policy, command, outcome, &mut step);
    transition(store, settled, &mut step);
    after_outcome(store, pipeline, &mut step);
    step
}

/// Handle a command the executor refused. The fault is reported and the
/// command is routed like a failure, so it is neither lost nor retried
/// forever.
pub fn handle_dispatch_failure(
    store: &mut QueueStore,
    pipeline: &mut PipelineStatus,
    policy: &RetryPolicy,
    command: Command,
    reason: String,
) -> CoreStep {
    let fault = PipelineFault::DispatchFailed {
        command: command.id().to_string(),
        reason,
    };
    error!(error = %fault, "pipeline fault; continuing with next command");

    let outcome = CommandOutcome::Failed(fault.to_string());
    let mut step = handle_completion(store, pipeline, policy, command, outcome);
    step.commands.insert(0, CoreCommand::ReportFault(fault));
    step
}

/// Handle a stop request.
pub fn handle_stop(store: &mut QueueStore, pipeline: &mut PipelineStatus) -> CoreStep {
    let mut step = CoreStep::new();

    pipeline.phase = PipelinePhase::Stopping;

    match &pipeline.in_flight {
        Some(current) => {
            info!(command = %current.id, "stop requested; waiting for in-flight command");
        }
        None => {
            info!("stop requested; pipeline idle");
            transition(store, CommanderState::Idle, &mut step);
            step.keep_running = false;
        }
    }

    step
}

/// Record the outcome and move the command to Done or Error (then sweep).
/// Returns the state this outcome settles the orchestrator in.
fn route_outcome(
    store: &mut QueueStore,
    policy: &RetryPolicy,
    mut command: Command,
    outcome: CommandOutcome,
    step: &mut CoreStep,
) -> CommanderState {
    match outcome {
        CommandOutcome::Success(output) => {
            info!(command = %command.id(), "command succeeded");
            command.record(CommandEventType::Success, output);
            store.push_done(command);
            step.publish_queue(QueueKind::Done);
            CommanderState::Done
        }
        CommandOutcome::Failed(reason) => {
            info!(command = %command.id(), error = %reason, "command failed");
            command.record(CommandEventType::Fail, Some(reason));
            store.push_error(command);
            step.publish_queue(QueueKind::Error);

            let dead = retry::sweep(store, policy);
            if !dead.is_empty() {
                step.publish_queue(QueueKind::Dead);
            }
            CommanderState::Error
        }
    }
}

fn after_outcome(store: &mut QueueStore, pipeline: &mut PipelineStatus, step: &mut CoreStep) {
    match pipeline.phase {
        PipelinePhase::Running => dispatch_next(store, pipeline, step),
        PipelinePhase::Stopping => {
            info!("in-flight command settled after stop; pipeline exiting");
            transition(store, CommanderState::Idle, step);
            step.keep_running = false;
        }
        PipelinePhase::AwaitingInit => transition(store, CommanderState::Idle, step),
    }
}

/// Dequeue the head of Waiting if the pipeline is free, or settle to Idle.
fn dispatch_next(store: &mut QueueStore, pipeline: &mut PipelineStatus, step: &mut CoreStep) {
    if pipeline.phase != PipelinePhase::Running || pipeline.in_flight.is_some() {
        return;
    }

    match store.pop_waiting() {
        Some(mut command) => {
            let token = pipeline.next_token;
            pipeline.next_token += 1;

            command.record(CommandEventType::Start, None);
            command.set_dispatch_token(token);
            debug!(
                command = %command.id(),
                token,
                remaining = store.len(QueueKind::Waiting),
                "dispatching command"
            );
            pipeline.in_flight = Some(InFlight {
                id: command.id().to_string(),
                token,
            });
            step.publish_queue(QueueKind::Waiting);
            transition(store, CommanderState::Executing, step);
            step.commands.push(CoreCommand::Dispatch(command));
        }
        None => transition(store, CommanderState::Idle, step),
    }
}

fn transition(store: &mut QueueStore, state: CommanderState, step: &mut CoreStep) {
    if store.set_state(state) {
        step.commands.push(CoreCommand::PublishState(state));
    }
}
