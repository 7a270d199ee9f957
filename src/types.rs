use std::fmt;
use std::str::FromStr;

/// Process-wide state of the orchestrator.
///
/// `Done` and `Error` are transient markers set right after the most recent
/// command finished; the pipeline then moves on to `Executing` (more work
/// waiting) or settles to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommanderState {
    #[default]
    Idle,
    Executing,
    Done,
    Error,
}

impl fmt::Display for CommanderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommanderState::Idle => "idle",
            CommanderState::Executing => "executing",
            CommanderState::Done => "done",
            CommanderState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Which of the four queues a snapshot or subscription refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueKind {
    Waiting,
    Done,
    Error,
    Dead,
}

impl QueueKind {
    pub const ALL: [QueueKind; 4] = [
        QueueKind::Waiting,
        QueueKind::Done,
        QueueKind::Error,
        QueueKind::Dead,
    ];
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueueKind::Waiting => "waiting",
            QueueKind::Done => "done",
            QueueKind::Error => "error",
            QueueKind::Dead => "dead",
        };
        f.write_str(s)
    }
}

impl FromStr for QueueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "waiting" => Ok(QueueKind::Waiting),
            "done" => Ok(QueueKind::Done),
            "error" => Ok(QueueKind::Error),
            "dead" => Ok(QueueKind::Dead),
            other => Err(format!(
                "invalid queue kind: {other} (expected \"waiting\", \"done\", \"error\" or \"dead\")"
            )),
        }
    }
}
