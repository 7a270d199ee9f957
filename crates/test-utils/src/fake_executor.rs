use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use commander::command::Command;
use commander::engine::{CommandOutcome, RuntimeEvent, RuntimeMessage};
use commander::exec::{DispatchError, DispatchFuture, ExecutorBackend, RealExecutorBackend};

/// An executor that refuses the first `refusals` dispatches, then hands
/// everything to the real executor.
///
/// Records the id of every dispatch attempt, refused or not.
pub struct RefusingExecutor {
    refusals: usize,
    inner: RealExecutorBackend,
    dispatched: Arc<Mutex<Vec<String>>>,
}

impl RefusingExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeMessage>,
        refusals: usize,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            refusals,
            inner: RealExecutorBackend::new(runtime_tx),
            dispatched,
        }
    }
}

impl ExecutorBackend for RefusingExecutor {
    fn dispatch(&mut self, command: Command) -> DispatchFuture<'_> {
        {
            let mut guard = self.dispatched.lock().unwrap();
            guard.push(command.id().to_string());
        }

        if self.refusals > 0 {
            self.refusals -= 1;
            return Box::pin(async move {
                Err(DispatchError {
                    command,
                    reason: "executor unavailable".to_string(),
                })
            });
        }

        self.inner.dispatch(command)
    }
}

/// An executor that never runs anything itself: dispatched commands are
/// handed to the test through a [`ManualHandle`], which decides when and how
/// they complete.
pub struct ManualExecutor {
    dispatched_tx: mpsc::UnboundedSender<Command>,
}

pub struct ManualHandle {
    runtime_tx: mpsc::Sender<RuntimeMessage>,
    dispatched_rx: mpsc::UnboundedReceiver<Command>,
}

impl ManualExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeMessage>) -> (Self, ManualHandle) {
        let (dispatched_tx, dispatched_rx) = mpsc::unbounded_channel();
        let handle = ManualHandle {
            runtime_tx,
            dispatched_rx,
        };
        (Self { dispatched_tx }, handle)
    }
}

impl ExecutorBackend for ManualExecutor {
    fn dispatch(&mut self, command: Command) -> DispatchFuture<'_> {
        let tx = self.dispatched_tx.clone();
        Box::pin(async move {
            tx.send(command).map_err(|err| DispatchError {
                command: err.0,
                reason: "manual handle dropped".to_string(),
            })
        })
    }
}

impl ManualHandle {
    /// Next command the runtime dispatched.
    pub async fn next_dispatched(&mut self) -> Command {
        self.dispatched_rx
            .recv()
            .await
            .expect("manual executor closed")
    }

    /// Whether a dispatch is waiting to be picked up.
    pub fn has_pending(&self) -> bool {
        !self.dispatched_rx.is_empty()
    }

    /// Report an outcome for `command` to the runtime.
    pub async fn complete(&self, command: Command, outcome: CommandOutcome) {
        self.runtime_tx
            .send(RuntimeEvent::CommandCompleted { command, outcome }.into())
            .await
            .expect("runtime closed");
    }
}

/// An executor whose dispatch never resolves, wedging the runtime inside the
/// first dispatch it makes. The command handed to it is dropped.
pub struct StalledExecutor;

impl ExecutorBackend for StalledExecutor {
    fn dispatch(&mut self, command: Command) -> DispatchFuture<'_> {
        drop(command);
        Box::pin(std::future::pending())
    }
}
