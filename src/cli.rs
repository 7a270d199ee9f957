// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `commander`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "commander",
    version,
    about = "Run shell commands one at a time, with replay and dead-lettering.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Commander.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Commander.toml")]
    pub config: String,

    /// Keep replaying failed commands until none are left in the error queue
    /// (each one either succeeds or is dead-lettered).
    #[arg(long)]
    pub replay_until_settled: bool,

    /// Upper bound on replay rounds with `--replay-until-settled`.
    #[arg(long, value_name = "N")]
    pub max_replays: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COMMANDER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the commands, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
