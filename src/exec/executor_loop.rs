// src/exec/executor_loop.rs

//! Background loop that runs dispatched commands.

use tokio::sync::mpsc;
use tracing::info;

use crate::command::Command;
use crate::engine::RuntimeMessage;
use crate::exec::command_runner::run_command;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<Command>` is what `RealExecutorBackend` uses to
/// hand over work. Commands are run strictly one after the other: the next
/// one is not even received until the previous one has reported back.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeMessage>) -> mpsc::Sender<Command> {
    let (tx, mut rx) = mpsc::channel::<Command>(1);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(command) = rx.recv().await {
            run_command(command, &runtime_tx).await;
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
