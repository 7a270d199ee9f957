// src/exec/command_runner.rs

//! Runs a single command's capability and reports the outcome.

use std::any::Any;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::engine::{CommandOutcome, RuntimeEvent, RuntimeMessage};

/// Run the capability of `command` once and send `CommandCompleted` back to
/// the runtime, moving the command along with it.
///
/// The capability runs on its own Tokio task so a panic inside it is caught
/// and recorded as a failure of that command instead of killing the loop.
pub async fn run_command(command: Command, runtime_tx: &mpsc::Sender<RuntimeMessage>) {
    info!(command = %command.id(), "executing command");

    let outcome = execute(&command).await;

    match &outcome {
        CommandOutcome::Success(output) => {
            debug!(command = %command.id(), ?output, "capability resolved");
        }
        CommandOutcome::Failed(reason) => {
            debug!(command = %command.id(), error = %reason, "capability failed");
        }
    }

    let id = command.id().to_string();
    let event = RuntimeEvent::CommandCompleted { command, outcome };
    if runtime_tx.send(event.into()).await.is_err() {
        warn!(command = %id, "runtime has shut down; dropping command outcome");
    }
}

async fn execute(command: &Command) -> CommandOutcome {
    let action = command.action();
    let handle = tokio::spawn(async move { action.execute().await });

    match handle.await {
        Ok(Ok(output)) => CommandOutcome::Success(output),
        Ok(Err(err)) => CommandOutcome::Failed(format!("{err:#}")),
        Err(join_err) if join_err.is_panic() => {
            let message = panic_message(join_err.into_panic());
            error!(command = %command.id(), panic = %message, "command panicked");
            CommandOutcome::Failed(format!("command panicked: {message}"))
        }
        Err(join_err) => CommandOutcome::Failed(format!("command task aborted: {join_err}")),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
