// src/command/mod.rs

//! Commands: the units of work the orchestrator runs.
//!
//! - [`Execute`] is the capability contract a command implements. The
//!   orchestrator only distinguishes success from failure.
//! - [`Command`] pairs an id and a capability with its [`Ledger`].
//! - [`CommandSnapshot`] is the read-only view handed out to observers.
//! - [`ledger`] holds the append-only event history.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod ledger;

pub use ledger::{CommandEvent, CommandEventType, Ledger};

/// Identifier of a command. Not required to be unique.
pub type CommandId = String;

/// What a capability yields: an optional opaque output on success, or the
/// error that made it fail.
pub type ExecuteResult = anyhow::Result<Option<String>>;

pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = ExecuteResult> + Send + 'a>>;

/// Capability contract consumed by the orchestrator.
pub trait Execute: Send + Sync {
    /// Perform the side effect once. Called again on every replay.
    fn execute(&self) -> ExecuteFuture<'_>;
}

/// Adapter turning an async closure into an [`Execute`] implementation.
pub struct CommandFn<F> {
    f: F,
}

impl<F> CommandFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Execute for CommandFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ExecuteResult> + Send + 'static,
{
    fn execute(&self) -> ExecuteFuture<'_> {
        Box::pin((self.f)())
    }
}

/// A unit of work plus its lifecycle history.
///
/// `Command` is not `Clone`: it is moved from queue to queue
/// (and into the executor while in flight), so it is only ever held by one
/// owner.
pub struct Command {
    id: CommandId,
    action: Arc<dyn Execute>,
    ledger: Ledger,
    /// Set when the pipeline hands the command to the executor; identifies
    /// that one dispatch, since ids may repeat.
    dispatch_token: Option<u64>,
}

impl Command {
    pub fn new(id: impl Into<CommandId>, action: impl Execute + 'static) -> Self {
        Self {
            id: id.into(),
            action: Arc::new(action),
            ledger: Ledger::new(),
            dispatch_token: None,
        }
    }

    /// Build a command from an async closure.
    ///
    /// ```no_run
    /// use commander::command::Command;
    ///
    /// let cmd = Command::from_fn("ping", || async { Ok(Some("pong".to_string())) });
    /// ```
    pub fn from_fn<F, Fut>(id: impl Into<CommandId>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExecuteResult> + Send + 'static,
    {
        Self::new(id, CommandFn::new(f))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Shared handle on the capability, so it can run on another task while
    /// the command itself stays with the executor.
    pub fn action(&self) -> Arc<dyn Execute> {
        Arc::clone(&self.action)
    }

    pub(crate) fn record(&mut self, kind: CommandEventType, data: Option<String>) {
        self.ledger.record(&self.id, kind, data);
    }

    pub(crate) fn dispatch_token(&self) -> Option<u64> {
        self.dispatch_token
    }

    pub(crate) fn set_dispatch_token(&mut self, token: u64) {
        self.dispatch_token = Some(token);
    }

    pub fn snapshot(&self) -> CommandSnapshot {
        CommandSnapshot {
            id: self.id.clone(),
            events: self.ledger.as_slice().to_vec(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("events", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

/// Point-in-time copy of a command's id and ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSnapshot {
    pub id: CommandId,
    pub events: Vec<CommandEvent>,
}

impl CommandSnapshot {
    pub fn count(&self, kind: CommandEventType) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn last_event(&self) -> Option<&CommandEvent> {
        self.events.last()
    }

    pub fn kinds(&self) -> Vec<CommandEventType> {
        self.events.iter().map(|e| e.kind).collect()
    }
}
