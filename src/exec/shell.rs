// src/exec/shell.rs

//! Shell-backed command capability used by the `commander` binary.

use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::process::Command as ProcessCommand;
use tracing::debug;

use crate::command::{Execute, ExecuteFuture};

/// Runs a shell command line; a non-zero exit status is a failure.
///
/// On success the trimmed stdout (if any) becomes the SUCCESS event's data.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    cmd: String,
}

impl ShellCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn process(&self) -> ProcessCommand {
        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = ProcessCommand::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = ProcessCommand::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Execute for ShellCommand {
    fn execute(&self) -> ExecuteFuture<'_> {
        Box::pin(async move {
            let output = self
                .process()
                .output()
                .await
                .with_context(|| format!("spawning process for `{}`", self.cmd))?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            for line in stderr.lines() {
                debug!(cmd = %self.cmd, "stderr: {}", line);
            }

            if !output.status.success() {
                let code = output.status.code().unwrap_or(-1);
                let last_err = stderr.lines().last().unwrap_or("").trim();
                if last_err.is_empty() {
                    bail!("`{}` exited with code {code}", self.cmd);
                }
                bail!("`{}` exited with code {code}: {last_err}", self.cmd);
            }

            let stdout = stdout.trim();
            Ok((!stdout.is_empty()).then(|| stdout.to_string()))
        })
    }
}
