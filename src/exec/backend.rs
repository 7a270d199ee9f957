// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running commands
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production executor in [`executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by
//!   `Commander::new`. It forwards each dispatched command to the background
//!   executor loop, which runs it and reports back with a
//!   `RuntimeEvent::CommandCompleted`.
//! - Tests can provide their own `ExecutorBackend` that, for example,
//!   completes commands immediately or refuses them to provoke faults.
//!
//! [`executor_loop`]: super::executor_loop

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::command::Command;
use crate::engine::RuntimeMessage;

use super::executor_loop::spawn_executor;

/// A command the backend could not accept, handed back so it is not lost.
#[derive(Debug)]
pub struct DispatchError {
    pub command: Command,
    pub reason: String,
}

pub type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<(), DispatchError>> + Send + 'a>>;

/// Trait abstracting how a dispatched command is executed.
///
/// The runtime dispatches at most one command at a time and waits for its
/// `CommandCompleted` event before dispatching the next one. Implementations
/// must eventually send exactly one completion per accepted command.
pub trait ExecutorBackend: Send {
    /// Accept the command for execution.
    ///
    /// This should return quickly: the actual work happens in the background
    /// and its outcome arrives on the runtime channel.
    fn dispatch(&mut self, command: Command) -> DispatchFuture<'_>;
}

/// Real executor backend used in production.
///
/// Internally, this wraps the executor loop in [`spawn_executor`]. The
/// runtime calls `dispatch`, which forwards the command to the background
/// loop via an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<Command>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeMessage>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(&mut self, command: Command) -> DispatchFuture<'_> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(command).await.map_err(|err| DispatchError {
                command: err.0,
                reason: "executor loop has shut down".to_string(),
            })
        })
    }
}
