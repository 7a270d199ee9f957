// tests/shell_command.rs

#![cfg(unix)]

mod common;
use crate::common::{ids, init_tracing, settle, start_commander, TestResult};

use commander::command::{Command, Execute};
use commander::exec::ShellCommand;
use commander::QueueKind;

#[tokio::test]
async fn successful_process_yields_trimmed_stdout() -> TestResult {
    init_tracing();

    let output = ShellCommand::new("echo '  hello  '").execute().await?;
    assert_eq!(output.as_deref(), Some("hello"));

    let silent = ShellCommand::new("true").execute().await?;
    assert_eq!(silent, None);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_failure_with_code_and_stderr() {
    init_tracing();

    let err = ShellCommand::new("echo broken >&2; exit 3")
        .execute()
        .await
        .expect_err("exit 3 must fail");
    let msg = format!("{err:#}");

    assert!(msg.contains("code 3"), "unexpected message: {msg}");
    assert!(msg.contains("broken"), "unexpected message: {msg}");
}

#[tokio::test]
async fn shell_commands_flow_through_the_commander() -> TestResult {
    init_tracing();

    let commander = start_commander(0).await;
    commander
        .add_command(Command::new("ok", ShellCommand::new("echo fine")))
        .await?;
    commander
        .add_command(Command::new("bad", ShellCommand::new("exit 1")))
        .await?;
    settle(&commander).await;

    let done = commander.commands(QueueKind::Done);
    assert_eq!(ids(&done), vec!["ok"]);
    assert_eq!(done[0].last_event().unwrap().data.as_deref(), Some("fine"));
    assert_eq!(ids(&commander.commands(QueueKind::Dead)), vec!["bad"]);

    commander.shutdown().await?;
    Ok(())
}
