// tests/pipeline_faults.rs

mod common;
use crate::common::builders::{ok_command, CommandBuilder};
use crate::common::{ids, init_tracing, settle, with_timeout, TestResult};
use commander_test_utils::fake_executor::{ManualExecutor, RefusingExecutor};

use std::sync::{Arc, Mutex};

use commander::command::CommandEventType;
use commander::engine::CommandOutcome;
use commander::errors::PipelineFault;
use commander::{Commander, CommanderConfig, CommanderState, QueueKind};

#[tokio::test]
async fn refused_dispatch_is_reported_and_pipeline_continues() -> TestResult {
    init_tracing();

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&dispatched);
    let commander = Commander::with_executor(move |tx| RefusingExecutor::new(tx, 1, seen));
    let mut faults = commander.subscribe_faults();
    commander.init(CommanderConfig::with_max_retries(3)).await?;

    commander.add_command(ok_command("refused")).await?;
    commander.add_command(ok_command("accepted")).await?;
    settle(&commander).await;

    let fault = with_timeout(faults.recv()).await?;
    match fault {
        PipelineFault::DispatchFailed { command, reason } => {
            assert_eq!(command, "refused");
            assert_eq!(reason, "executor unavailable");
        }
        other => panic!("expected DispatchFailed, got {other:?}"),
    }

    let error = commander.commands(QueueKind::Error);
    assert_eq!(ids(&error), vec!["refused"]);
    assert_eq!(error[0].count(CommandEventType::Fail), 1);
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["accepted"]);
    assert_eq!(*dispatched.lock().unwrap(), vec!["refused", "accepted"]);

    // The refused command is not lost: a replay runs it for real.
    commander.replay_commands_in_error().await?;
    settle(&commander).await;
    assert_eq!(
        ids(&commander.commands(QueueKind::Done)),
        vec!["accepted", "refused"]
    );

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn stray_completion_is_reported_as_fault() -> TestResult {
    init_tracing();

    let mut slot = None;
    let commander = Commander::with_executor(|tx| {
        let (executor, handle) = ManualExecutor::new(tx);
        slot = Some(handle);
        executor
    });
    let mut handle = slot.expect("executor built");
    let mut faults = commander.subscribe_faults();
    commander.init(CommanderConfig::default()).await?;

    commander.add_command(ok_command("real")).await?;
    let real = with_timeout(handle.next_dispatched()).await;
    handle
        .complete(real, CommandOutcome::Success(None))
        .await;
    settle(&commander).await;

    // Nothing is in flight now; a completion out of nowhere is a fault.
    handle
        .complete(ok_command("ghost"), CommandOutcome::Success(None))
        .await;

    let fault = with_timeout(faults.recv()).await?;
    assert_eq!(
        fault,
        PipelineFault::UnexpectedCompletion {
            command: "ghost".to_string()
        }
    );

    let done = with_timeout(
        commander
            .subscribe(QueueKind::Done)
            .wait_for(|done| done.len() == 2),
    )
    .await?
    .clone();
    assert_eq!(ids(&done), vec!["real", "ghost"]);
    assert_eq!(commander.state(), CommanderState::Idle);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn manual_executor_sees_one_dispatch_at_a_time() -> TestResult {
    init_tracing();

    let mut slot = None;
    let commander = Commander::with_executor(|tx| {
        let (executor, handle) = ManualExecutor::new(tx);
        slot = Some(handle);
        executor
    });
    let mut handle = slot.expect("executor built");
    commander.init(CommanderConfig::with_max_retries(1)).await?;

    commander.add_command(CommandBuilder::new("a").build()).await?;
    commander.add_command(CommandBuilder::new("b").build()).await?;

    let a = with_timeout(handle.next_dispatched()).await;
    assert_eq!(a.id(), "a");
    assert!(!handle.has_pending(), "b must not be dispatched while a is in flight");
    assert_eq!(ids(&commander.commands(QueueKind::Waiting)), vec!["b"]);

    handle
        .complete(a, CommandOutcome::Failed("nope".to_string()))
        .await;

    let b = with_timeout(handle.next_dispatched()).await;
    assert_eq!(b.id(), "b");
    handle.complete(b, CommandOutcome::Success(None)).await;
    settle(&commander).await;

    let error = commander.commands(QueueKind::Error);
    assert_eq!(ids(&error), vec!["a"]);
    assert_eq!(error[0].last_event().unwrap().data.as_deref(), Some("nope"));
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["b"]);

    commander.shutdown().await?;
    Ok(())
}
