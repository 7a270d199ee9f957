// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommanderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Commander runtime has stopped")]
    Stopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CommanderError>;

/// Unexpected failure in the orchestration plumbing itself, as opposed to a
/// command failing. Broadcast to subscribers; the pipeline carries on with
/// the next waiting command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineFault {
    #[error("failed to dispatch command '{command}' to the executor: {reason}")]
    DispatchFailed { command: String, reason: String },

    #[error("completion for command '{command}' arrived while no command was in flight")]
    UnexpectedCompletion { command: String },
}
