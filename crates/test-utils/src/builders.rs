#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use commander::command::{Command, Execute, ExecuteFuture};
use commander::config::{CommandSpec, ConfigFile, ErrorSection, RawConfigFile};

/// Shared, ordered record of which commands actually executed.
pub type ExecLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> ExecLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_contents(log: &ExecLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Command that always succeeds.
pub fn ok_command(id: &str) -> Command {
    CommandBuilder::new(id).succeeds().build()
}

/// Command that always fails.
pub fn failing_command(id: &str) -> Command {
    CommandBuilder::new(id).fails().build()
}

/// Tracks how many capabilities run at the same time.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    inner: Arc<(AtomicUsize, AtomicUsize)>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> ProbeGuard {
        let now = self.inner.0.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.1.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            probe: self.clone(),
        }
    }

    /// Highest number of simultaneously running capabilities seen.
    pub fn max_concurrent(&self) -> usize {
        self.inner.1.load(Ordering::SeqCst)
    }
}

pub struct ProbeGuard {
    probe: ConcurrencyProbe,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.inner.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builder for commands with scripted behaviour.
pub struct CommandBuilder {
    id: String,
    outcomes: VecDeque<bool>,
    fallback: bool,
    log: Option<ExecLog>,
    gate: Option<Arc<Notify>>,
    probe: Option<ConcurrencyProbe>,
    attempts: Option<Arc<AtomicUsize>>,
    delay: Option<Duration>,
    panics: bool,
}

impl CommandBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            outcomes: VecDeque::new(),
            fallback: true,
            log: None,
            gate: None,
            probe: None,
            attempts: None,
            delay: None,
            panics: false,
        }
    }

    pub fn succeeds(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn fails(mut self) -> Self {
        self.fallback = false;
        self
    }

    /// Per-attempt outcomes (`true` = success); once used up, the builder's
    /// fallback (`succeeds` / `fails`) applies.
    pub fn outcomes(mut self, outcomes: &[bool]) -> Self {
        self.outcomes = outcomes.iter().copied().collect();
        self
    }

    pub fn log_to(mut self, log: &ExecLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    /// Block each attempt until the gate is notified.
    pub fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    pub fn probe(mut self, probe: &ConcurrencyProbe) -> Self {
        self.probe = Some(probe.clone());
        self
    }

    pub fn count_attempts(mut self, attempts: &Arc<AtomicUsize>) -> Self {
        self.attempts = Some(Arc::clone(attempts));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn build(self) -> Command {
        let action = ScriptedAction {
            id: self.id.clone(),
            outcomes: Mutex::new(self.outcomes),
            fallback: self.fallback,
            log: self.log,
            gate: self.gate,
            probe: self.probe,
            attempts: self.attempts,
            delay: self.delay,
            panics: self.panics,
        };
        Command::new(self.id, action)
    }
}

struct ScriptedAction {
    id: String,
    outcomes: Mutex<VecDeque<bool>>,
    fallback: bool,
    log: Option<ExecLog>,
    gate: Option<Arc<Notify>>,
    probe: Option<ConcurrencyProbe>,
    attempts: Option<Arc<AtomicUsize>>,
    delay: Option<Duration>,
    panics: bool,
}

impl Execute for ScriptedAction {
    fn execute(&self) -> ExecuteFuture<'_> {
        Box::pin(async move {
            let _guard = self.probe.as_ref().map(ConcurrencyProbe::enter);

            if let Some(log) = &self.log {
                log.lock().unwrap().push(self.id.clone());
            }
            if let Some(attempts) = &self.attempts {
                attempts.fetch_add(1, Ordering::SeqCst);
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panics {
                panic!("scripted panic in {}", self.id);
            }

            let ok = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);

            if ok {
                Ok(Some(format!("{} ok", self.id)))
            } else {
                Err(anyhow::anyhow!("{} failed", self.id))
            }
        })
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.config.error = ErrorSection {
            max_number_of_retries: max,
        };
        self
    }

    pub fn with_command(mut self, id: &str, cmd: &str) -> Self {
        self.config.command.push(CommandSpec {
            id: id.to_string(),
            cmd: cmd.to_string(),
        });
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
