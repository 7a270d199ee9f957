#![allow(dead_code)]

pub use commander_test_utils::builders;
pub use commander_test_utils::{init_tracing, settle, start_commander, with_timeout};

use commander::command::Command;
use commander::engine::{CoreCommand, CoreStep};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Pull the dispatched command (if any) out of a core step.
pub fn take_dispatched(step: &mut CoreStep) -> Option<Command> {
    let idx = step
        .commands
        .iter()
        .position(|c| matches!(c, CoreCommand::Dispatch(_)))?;
    match step.commands.remove(idx) {
        CoreCommand::Dispatch(command) => Some(command),
        _ => None,
    }
}

pub fn ids(snapshots: &[commander::CommandSnapshot]) -> Vec<String> {
    snapshots.iter().map(|s| s.id.clone()).collect()
}
