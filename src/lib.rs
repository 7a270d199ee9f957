// src/lib.rs

//! In-process command orchestrator.
//!
//! Commands (async, possibly failing units of work) are executed one at a
//! time in submission order. Outcomes land in the Done or Error queue;
//! errored commands can be replayed on demand and are moved to the Dead
//! queue once they fail more often than the configured retry budget allows.
//!
//! The public entry point is [`Commander`]. The `commander` binary built on
//! top of [`run`] drives it with shell commands read from a TOML file.

pub mod cli;
pub mod command;
pub mod commander;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

pub use command::{Command, CommandEvent, CommandEventType, CommandSnapshot, Execute};
pub use commander::Commander;
pub use config::CommanderConfig;
pub use types::{CommanderState, QueueKind};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::exec::ShellCommand;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the orchestrator and its real executor
/// - submission of every configured command, in file order
/// - optional replay rounds until the error queue is settled
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let commander = Commander::start(cfg.commander).await?;

    tokio::select! {
        res = drive(&commander, &cfg, &args) => res?,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            } else {
                warn!("Ctrl-C received; stopping after the in-flight command");
            }
        }
    }

    print_summary(&commander);
    commander.shutdown().await?;
    Ok(())
}

async fn drive(commander: &Commander, cfg: &ConfigFile, args: &CliArgs) -> Result<()> {
    for entry in cfg.commands.iter() {
        let command = Command::new(entry.id.clone(), ShellCommand::new(entry.cmd.clone()));
        commander.add_command(command).await?;
    }
    commander.wait_idle().await?;

    if !args.replay_until_settled {
        return Ok(());
    }

    let mut rounds = 0u32;
    while !commander.commands(QueueKind::Error).is_empty() {
        if args.max_replays.is_some_and(|max| rounds >= max) {
            warn!(rounds, "replay limit reached with commands still in error");
            break;
        }
        rounds += 1;
        info!(
            round = rounds,
            errored = commander.commands(QueueKind::Error).len(),
            "replaying commands in error"
        );
        commander.replay_commands_in_error().await?;
        commander.wait_idle().await?;
    }

    Ok(())
}

/// Print every queue with each command's ledger.
fn print_summary(commander: &Commander) {
    println!("commander summary (state: {})", commander.state());

    for kind in QueueKind::ALL {
        let commands = commander.commands(kind);
        println!("{kind} ({}):", commands.len());
        for snapshot in commands.iter() {
            let kinds: Vec<String> = snapshot.kinds().iter().map(|k| k.to_string()).collect();
            println!("  - {} [{}]", snapshot.id, kinds.join(" -> "));
            if let Some(data) = snapshot.events.iter().rev().find_map(|e| e.data.as_deref()) {
                println!("      last output: {data}");
            }
        }
    }
}

/// Simple dry-run output: print the retry budget and the commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("commander dry-run");
    println!(
        "  error.max_number_of_retries = {}",
        cfg.commander.error.max_number_of_retries
    );
    println!();

    println!("commands ({}):", cfg.commands.len());
    for entry in cfg.commands.iter() {
        println!("  - {}", entry.id);
        println!("      cmd: {}", entry.cmd);
    }
}
