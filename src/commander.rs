// src/commander.rs

//! Public orchestrator handle.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::command::{Command, CommandSnapshot};
use crate::config::CommanderConfig;
use crate::engine::{publish, CoreRuntime, Runtime, RuntimeEvent, RuntimeMessage, Views};
use crate::errors::{CommanderError, PipelineFault, Result};
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::types::{CommanderState, QueueKind};

const RUNTIME_CHANNEL_CAPACITY: usize = 64;

/// Handle on a running orchestrator.
///
/// Constructing a `Commander` spawns its runtime task, so it must happen
/// inside a Tokio runtime. Commands submitted before [`init`](Self::init)
/// are kept in Waiting and start running once it is called.
///
/// Every mutating method resolves only after the runtime has applied the
/// request: right after `add_command` on an idle orchestrator, `state()`
/// reads `Executing`.
///
/// ```no_run
/// use commander::{Commander, CommanderConfig, QueueKind};
/// use commander::command::Command;
///
/// # async fn demo() -> commander::errors::Result<()> {
/// let commander = Commander::start(CommanderConfig::with_max_retries(3)).await?;
/// commander
///     .add_command(Command::from_fn("hello", || async { Ok(None) }))
///     .await?;
/// commander.wait_idle().await?;
/// assert_eq!(commander.commands(QueueKind::Done).len(), 1);
/// commander.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Commander {
    tx: mpsc::Sender<RuntimeMessage>,
    views: Views,
    handle: Option<JoinHandle<Result<()>>>,
}

impl Commander {
    /// Spawn an orchestrator running commands on the production executor.
    pub fn new() -> Self {
        Self::with_executor(RealExecutorBackend::new)
    }

    /// Spawn an orchestrator using a custom executor backend.
    ///
    /// `build` receives the runtime sender the backend must use to report
    /// `CommandCompleted` events.
    pub fn with_executor<E, B>(build: B) -> Self
    where
        E: ExecutorBackend + 'static,
        B: FnOnce(mpsc::Sender<RuntimeMessage>) -> E,
    {
        let (tx, rx) = mpsc::channel::<RuntimeMessage>(RUNTIME_CHANNEL_CAPACITY);
        let executor = build(tx.clone());
        let (publisher, views) = publish::channel();

        let runtime = Runtime::new(CoreRuntime::new(), rx, executor, publisher);
        let handle = tokio::spawn(runtime.run());

        Self {
            tx,
            views,
            handle: Some(handle),
        }
    }

    /// `new` followed by `init`.
    pub async fn start(config: CommanderConfig) -> Result<Self> {
        let commander = Self::new();
        commander.init(config).await?;
        Ok(commander)
    }

    /// Install the retry budget for future sweeps and start processing.
    ///
    /// Calling it again only replaces the budget; ledgers of queued commands
    /// are untouched.
    pub async fn init(&self, config: CommanderConfig) -> Result<()> {
        self.request(RuntimeEvent::Initialized { config }).await
    }

    /// Append a command to Waiting. Starts it right away if idle.
    ///
    /// A failing command never makes this return an error; failures show up
    /// in the Error/Dead snapshots.
    pub async fn add_command(&self, command: Command) -> Result<()> {
        self.request(RuntimeEvent::CommandSubmitted { command }).await
    }

    /// Move every command in Error back to Waiting, in order, as one batch
    /// behind whatever is already waiting. A RESTART event is recorded on
    /// each. No-op when Error is empty.
    pub async fn replay_commands_in_error(&self) -> Result<()> {
        self.request(RuntimeEvent::ReplayRequested).await
    }

    /// Drop every dead command.
    pub async fn flush_dead_commands(&self) -> Result<()> {
        self.request(RuntimeEvent::FlushDeadRequested).await
    }

    /// Current ordered snapshot of the given queue.
    pub fn commands(&self, kind: QueueKind) -> Vec<CommandSnapshot> {
        self.views.commands(kind)
    }

    pub fn state(&self) -> CommanderState {
        self.views.state()
    }

    /// Receiver holding the latest full snapshot of the given queue.
    pub fn subscribe(&self, kind: QueueKind) -> watch::Receiver<Vec<CommandSnapshot>> {
        self.views.subscribe(kind)
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CommanderState> {
        self.views.subscribe_state()
    }

    /// Pipeline faults raised from now on.
    pub fn subscribe_faults(&self) -> broadcast::Receiver<PipelineFault> {
        self.views.subscribe_faults()
    }

    /// Resolve once the orchestrator reports `Idle`.
    ///
    /// Before `init` the state is already `Idle`, so this returns at once.
    pub async fn wait_idle(&self) -> Result<()> {
        let mut rx = self.views.subscribe_state();
        rx.wait_for(|state| *state == CommanderState::Idle)
            .await
            .map_err(|_| CommanderError::Stopped)?;
        Ok(())
    }

    /// Stop dequeuing. An in-flight command still runs to completion and its
    /// outcome is recorded; the runtime then exits. From the moment the stop
    /// is applied, every other request fails with [`CommanderError::Stopped`]
    /// (a command passed to `add_command` is dropped). Calling `stop` again is
    /// fine while the in-flight command is finishing.
    pub async fn stop(&self) -> Result<()> {
        self.request(RuntimeEvent::StopRequested).await
    }

    /// `stop` and wait for the runtime task to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        match self.stop().await {
            Ok(()) | Err(CommanderError::Stopped) => {}
            Err(e) => return Err(e),
        }

        match self.handle.take() {
            Some(handle) => handle.await.map_err(anyhow::Error::from)?,
            None => Ok(()),
        }
    }

    async fn request(&self, event: RuntimeEvent) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let message = RuntimeMessage {
            event,
            ack: Some(ack_tx),
        };

        self.tx
            .send(message)
            .await
            .map_err(|_| CommanderError::Stopped)?;
        ack_rx.await.unwrap_or(Err(CommanderError::Stopped))
    }
}

impl Default for Commander {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Commander {
    fn drop(&mut self) {
        let Some(handle) = &self.handle else {
            return;
        };

        debug!("commander handle dropped; requesting stop");
        match self.tx.try_send(RuntimeEvent::StopRequested.into()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("runtime channel full on drop; aborting runtime task");
                handle.abort();
            }
        }
    }
}
