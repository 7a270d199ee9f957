// src/engine/publish.rs

//! Snapshot publication.
//!
//! Every queue and the orchestrator state have a `watch` channel holding the
//! latest full snapshot, so a subscriber can render current state without
//! replaying history. Pipeline faults go out on a `broadcast` channel since
//! each fault matters on its own.

use tokio::sync::{broadcast, watch};
use tracing::trace;

use crate::command::CommandSnapshot;
use crate::errors::PipelineFault;
use crate::types::{CommanderState, QueueKind};

const FAULT_CAPACITY: usize = 64;

/// Sending half, owned by the runtime.
#[derive(Debug)]
pub struct ViewPublisher {
    waiting: watch::Sender<Vec<CommandSnapshot>>,
    done: watch::Sender<Vec<CommandSnapshot>>,
    error: watch::Sender<Vec<CommandSnapshot>>,
    dead: watch::Sender<Vec<CommandSnapshot>>,
    state: watch::Sender<CommanderState>,
    faults: broadcast::Sender<PipelineFault>,
}

/// Receiving half, owned by the `Commander` handle.
#[derive(Debug, Clone)]
pub struct Views {
    waiting: watch::Receiver<Vec<CommandSnapshot>>,
    done: watch::Receiver<Vec<CommandSnapshot>>,
    error: watch::Receiver<Vec<CommandSnapshot>>,
    dead: watch::Receiver<Vec<CommandSnapshot>>,
    state: watch::Receiver<CommanderState>,
    faults: broadcast::Sender<PipelineFault>,
}

/// Create a connected publisher / views pair, all empty and `Idle`.
pub fn channel() -> (ViewPublisher, Views) {
    let (waiting_tx, waiting_rx) = watch::channel(Vec::new());
    let (done_tx, done_rx) = watch::channel(Vec::new());
    let (error_tx, error_rx) = watch::channel(Vec::new());
    let (dead_tx, dead_rx) = watch::channel(Vec::new());
    let (state_tx, state_rx) = watch::channel(CommanderState::Idle);
    let (faults_tx, _) = broadcast::channel(FAULT_CAPACITY);

    let publisher = ViewPublisher {
        waiting: waiting_tx,
        done: done_tx,
        error: error_tx,
        dead: dead_tx,
        state: state_tx,
        faults: faults_tx.clone(),
    };

    let views = Views {
        waiting: waiting_rx,
        done: done_rx,
        error: error_rx,
        dead: dead_rx,
        state: state_rx,
        faults: faults_tx,
    };

    (publisher, views)
}

impl ViewPublisher {
    pub fn publish_queue(&self, kind: QueueKind, snapshot: Vec<CommandSnapshot>) {
        trace!(queue = %kind, len = snapshot.len(), "publishing queue snapshot");
        let tx = match kind {
            QueueKind::Waiting => &self.waiting,
            QueueKind::Done => &self.done,
            QueueKind::Error => &self.error,
            QueueKind::Dead => &self.dead,
        };
        tx.send_replace(snapshot);
    }

    pub fn publish_state(&self, state: CommanderState) {
        self.state.send_replace(state);
    }

    pub fn report_fault(&self, fault: PipelineFault) {
        // No subscribers is fine; the fault has already been logged.
        let _ = self.faults.send(fault);
    }
}

impl Views {
    pub fn subscribe(&self, kind: QueueKind) -> watch::Receiver<Vec<CommandSnapshot>> {
        match kind {
            QueueKind::Waiting => self.waiting.clone(),
            QueueKind::Done => self.done.clone(),
            QueueKind::Error => self.error.clone(),
            QueueKind::Dead => self.dead.clone(),
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<CommanderState> {
        self.state.clone()
    }

    pub fn subscribe_faults(&self) -> broadcast::Receiver<PipelineFault> {
        self.faults.subscribe()
    }

    pub fn commands(&self, kind: QueueKind) -> Vec<CommandSnapshot> {
        let rx = match kind {
            QueueKind::Waiting => &self.waiting,
            QueueKind::Done => &self.done,
            QueueKind::Error => &self.error,
            QueueKind::Dead => &self.dead,
        };
        rx.borrow().clone()
    }

    pub fn state(&self) -> CommanderState {
        *self.state.borrow()
    }
}
