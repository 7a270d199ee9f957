// src/exec/mod.rs

//! Command execution layer.
//!
//! This module is responsible for actually invoking command capabilities
//! and reporting back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.
//! - [`executor_loop`] owns the background loop that receives commands.
//! - [`command_runner`] runs one capability and emits `CommandCompleted`.
//! - [`shell`] is a capability that runs a shell command line.

pub mod backend;
pub mod command_runner;
pub mod executor_loop;
pub mod shell;

pub use backend::{DispatchError, DispatchFuture, ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use shell::ShellCommand;
