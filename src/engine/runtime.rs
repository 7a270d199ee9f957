// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{CommanderError, Result};
use crate::exec::{DispatchError, ExecutorBackend};

use super::core::CoreRuntime;
use super::publish::ViewPublisher;
use super::{CoreCommand, RuntimeEvent, RuntimeMessage};

/// Summary of everything one message caused.
struct Applied {
    keep_running: bool,
    rejected: bool,
}

/// Drives the core in response to `RuntimeMessage`s and delegates command
/// execution to an `ExecutorBackend`.
///
/// This is the single mutation point of the orchestrator: every submission,
/// replay, flush and completion is a message on one channel, applied one at
/// a time. Semantics live in `CoreRuntime`; this struct only moves data
/// between channels, the executor and the view publisher.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeMessage>,
    executor: E,
    views: ViewPublisher,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeMessage>,
        executor: E,
        views: ViewPublisher,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            views,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeMessage`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (dispatch, publish, report).
    /// - Acknowledges the message once everything it caused has been applied.
    pub async fn run(mut self) -> Result<()> {
        info!("commander runtime started");

        loop {
            let message = match self.event_rx.recv().await {
                Some(m) => m,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(event = ?message.event, "runtime received event");

            let applied = self.apply(message.event).await;

            if let Some(ack) = message.ack {
                let reply = if applied.rejected {
                    Err(CommanderError::Stopped)
                } else {
                    Ok(())
                };
                // The requester may have given up waiting; that's fine.
                let _ = ack.send(reply);
            }

            if !applied.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Apply one event plus any follow-up events it produced (a refused
    /// dispatch is fed straight back into the core).
    async fn apply(&mut self, event: RuntimeEvent) -> Applied {
        let mut pending = VecDeque::from([event]);
        let mut applied = Applied {
            keep_running: true,
            rejected: false,
        };

        while let Some(event) = pending.pop_front() {
            let step = self.core.step(event);
            applied.keep_running &= step.keep_running;
            applied.rejected |= step.rejected;

            for command in step.commands {
                if let Some(follow_up) = self.execute_command(command).await {
                    pending.push_back(follow_up);
                }
            }
        }

        applied
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Option<RuntimeEvent> {
        match command {
            CoreCommand::Dispatch(cmd) => {
                debug!(command = %cmd.id(), "handing command to executor");
                match self.executor.dispatch(cmd).await {
                    Ok(()) => None,
                    Err(DispatchError { command, reason }) => {
                        Some(RuntimeEvent::DispatchFailed { command, reason })
                    }
                }
            }
            CoreCommand::PublishQueue(kind) => {
                self.views.publish_queue(kind, self.core.snapshot(kind));
                None
            }
            CoreCommand::PublishState(state) => {
                self.views.publish_state(state);
                None
            }
            CoreCommand::ReportFault(fault) => {
                self.views.report_fault(fault);
                None
            }
        }
    }
}
