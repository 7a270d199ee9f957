// tests/commander_scenarios.rs

mod common;
use crate::common::builders::{
    failing_command, log_contents, new_log, ok_command, CommandBuilder, ConcurrencyProbe,
};
use crate::common::{ids, init_tracing, settle, start_commander, with_timeout, TestResult};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use commander::command::CommandEventType;
use commander::{Commander, CommanderConfig, CommanderState, QueueKind};

#[tokio::test]
async fn scenario_a_single_success_settles_idle() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    commander.add_command(ok_command("1")).await?;
    settle(&commander).await;

    let done = commander.commands(QueueKind::Done);
    assert_eq!(ids(&done), vec!["1"]);
    assert_eq!(done[0].count(CommandEventType::Success), 1);
    assert_eq!(done[0].count(CommandEventType::Fail), 0);
    assert_eq!(done[0].last_event().unwrap().data.as_deref(), Some("1 ok"));
    assert!(commander.commands(QueueKind::Error).is_empty());
    assert!(commander.commands(QueueKind::Dead).is_empty());
    assert_eq!(commander.state(), CommanderState::Idle);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn scenario_b_dead_letter_after_third_replay() -> TestResult {
    init_tracing();

    let attempts = Arc::new(AtomicUsize::new(0));
    let commander = start_commander(3).await;
    commander
        .add_command(
            CommandBuilder::new("error-1")
                .fails()
                .count_attempts(&attempts)
                .build(),
        )
        .await?;
    settle(&commander).await;
    assert_eq!(commander.commands(QueueKind::Error).len(), 1);

    for replay in 1..=3 {
        commander.replay_commands_in_error().await?;
        settle(&commander).await;

        if replay < 3 {
            assert_eq!(commander.commands(QueueKind::Error).len(), 1, "replay {replay}");
            assert!(commander.commands(QueueKind::Dead).is_empty(), "replay {replay}");
        }
    }

    assert!(commander.commands(QueueKind::Error).is_empty());
    let dead = commander.commands(QueueKind::Dead);
    assert_eq!(ids(&dead), vec!["error-1"]);
    assert_eq!(dead[0].count(CommandEventType::Fail), 4);
    assert_eq!(dead[0].count(CommandEventType::Dead), 1);
    assert_eq!(dead[0].last_event().unwrap().kind, CommandEventType::Dead);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    // Dead commands are never run again.
    commander.replay_commands_in_error().await?;
    settle(&commander).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn scenario_c_failure_then_success_back_to_back() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    commander
        .add_command(
            CommandBuilder::new("error-1")
                .fails()
                .delay(Duration::from_millis(20))
                .build(),
        )
        .await?;
    commander.add_command(ok_command("normal-1")).await?;
    settle(&commander).await;

    assert_eq!(ids(&commander.commands(QueueKind::Error)), vec!["error-1"]);
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["normal-1"]);
    assert!(commander.commands(QueueKind::Waiting).is_empty());
    assert_eq!(commander.state(), CommanderState::Idle);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn scenario_d_concurrent_submissions_wait_for_in_flight() -> TestResult {
    init_tracing();

    let gate = Arc::new(Notify::new());
    let log = new_log();
    let probe = ConcurrencyProbe::new();

    let commander = start_commander(3).await;
    commander
        .add_command(
            CommandBuilder::new("a")
                .gated(&gate)
                .log_to(&log)
                .probe(&probe)
                .build(),
        )
        .await?;
    assert_eq!(commander.state(), CommanderState::Executing);

    let b = CommandBuilder::new("b").log_to(&log).probe(&probe).build();
    let c = CommandBuilder::new("c").log_to(&log).probe(&probe).build();
    let (rb, rc) = tokio::join!(commander.add_command(b), commander.add_command(c));
    rb?;
    rc?;

    assert_eq!(ids(&commander.commands(QueueKind::Waiting)), vec!["b", "c"]);
    assert_eq!(commander.state(), CommanderState::Executing);
    assert!(!log_contents(&log).contains(&"b".to_string()));

    gate.notify_one();
    settle(&commander).await;

    assert_eq!(log_contents(&log), vec!["a", "b", "c"]);
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["a", "b", "c"]);
    assert_eq!(probe.max_concurrent(), 1);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn completion_order_matches_submission_order() -> TestResult {
    init_tracing();

    let log = new_log();
    let probe = ConcurrencyProbe::new();
    let commander = start_commander(3).await;

    let mut expected_done = Vec::new();
    let mut expected_error = Vec::new();
    for i in 0..10 {
        let id = format!("cmd-{i}");
        let builder = CommandBuilder::new(&id)
            .log_to(&log)
            .probe(&probe)
            .delay(Duration::from_millis((10 - i) as u64));
        let builder = if i % 3 == 0 {
            expected_error.push(id.clone());
            builder.fails()
        } else {
            expected_done.push(id.clone());
            builder.succeeds()
        };
        commander.add_command(builder.build()).await?;
    }
    settle(&commander).await;

    let expected_all: Vec<String> = (0..10).map(|i| format!("cmd-{i}")).collect();
    assert_eq!(log_contents(&log), expected_all);
    assert_eq!(ids(&commander.commands(QueueKind::Done)), expected_done);
    assert_eq!(ids(&commander.commands(QueueKind::Error)), expected_error);
    assert_eq!(probe.max_concurrent(), 1);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn replay_records_restart_and_can_succeed() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    commander
        .add_command(
            CommandBuilder::new("flaky")
                .outcomes(&[false, true])
                .build(),
        )
        .await?;
    settle(&commander).await;
    assert_eq!(ids(&commander.commands(QueueKind::Error)), vec!["flaky"]);

    commander.replay_commands_in_error().await?;
    settle(&commander).await;

    assert!(commander.commands(QueueKind::Error).is_empty());
    let done = commander.commands(QueueKind::Done);
    assert_eq!(
        done[0].kinds(),
        vec![
            CommandEventType::Start,
            CommandEventType::Fail,
            CommandEventType::Restart,
            CommandEventType::Start,
            CommandEventType::Success,
        ]
    );

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn replay_on_empty_error_queue_changes_nothing() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    commander.add_command(ok_command("a")).await?;
    settle(&commander).await;

    let mut state_rx = commander.subscribe_state();
    state_rx.mark_unchanged();

    commander.replay_commands_in_error().await?;

    assert!(!state_rx.has_changed()?);
    assert_eq!(commander.state(), CommanderState::Idle);
    assert!(commander.commands(QueueKind::Waiting).is_empty());
    assert_eq!(commander.commands(QueueKind::Done).len(), 1);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn flush_dead_leaves_other_queues_alone() -> TestResult {
    init_tracing();

    let commander = start_commander(0).await;
    commander.add_command(failing_command("doomed")).await?;
    commander.add_command(ok_command("fine")).await?;
    settle(&commander).await;
    assert_eq!(ids(&commander.commands(QueueKind::Dead)), vec!["doomed"]);

    commander.flush_dead_commands().await?;

    assert!(commander.commands(QueueKind::Dead).is_empty());
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["fine"]);
    assert!(commander.commands(QueueKind::Error).is_empty());
    assert!(commander.commands(QueueKind::Waiting).is_empty());

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn commands_wait_until_init() -> TestResult {
    init_tracing();

    let log = new_log();
    let commander = Commander::new();
    commander
        .add_command(CommandBuilder::new("early").log_to(&log).build())
        .await?;

    assert_eq!(ids(&commander.commands(QueueKind::Waiting)), vec!["early"]);
    assert_eq!(commander.state(), CommanderState::Idle);
    assert!(log_contents(&log).is_empty());

    commander.init(CommanderConfig::default()).await?;
    settle(&commander).await;

    assert_eq!(log_contents(&log), vec!["early"]);
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["early"]);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn subscribers_see_full_snapshots() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    let mut done_rx = commander.subscribe(QueueKind::Done);

    commander.add_command(ok_command("a")).await?;
    commander.add_command(ok_command("b")).await?;

    let snapshot = with_timeout(done_rx.wait_for(|done| done.len() == 2)).await?;
    assert_eq!(ids(&snapshot), vec!["a", "b"]);
    drop(snapshot);

    commander.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn panicking_command_is_recorded_as_failure() -> TestResult {
    init_tracing();

    let commander = start_commander(3).await;
    commander
        .add_command(CommandBuilder::new("kaboom").panicking().build())
        .await?;
    commander.add_command(ok_command("after")).await?;
    settle(&commander).await;

    let error = commander.commands(QueueKind::Error);
    assert_eq!(ids(&error), vec!["kaboom"]);
    let data = error[0].last_event().unwrap().data.clone().unwrap_or_default();
    assert!(data.contains("panicked"), "unexpected data: {data}");
    assert_eq!(ids(&commander.commands(QueueKind::Done)), vec!["after"]);

    commander.shutdown().await?;
    Ok(())
}
