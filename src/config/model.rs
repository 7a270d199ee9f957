// src/config/model.rs

use serde::Deserialize;

/// Retry budget used when nothing is configured.
pub const DEFAULT_MAX_NUMBER_OF_RETRIES: u32 = 3;

/// Orchestrator configuration, supplied to `Commander::init`.
///
/// ```toml
/// [error]
/// max_number_of_retries = 3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CommanderConfig {
    /// Failure handling from `[error]`.
    #[serde(default)]
    pub error: ErrorSection,
}

impl CommanderConfig {
    pub fn with_max_retries(max_number_of_retries: u32) -> Self {
        Self {
            error: ErrorSection {
                max_number_of_retries,
            },
        }
    }
}

/// `[error]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorSection {
    /// How many replays a failing command gets. A command is dead-lettered
    /// once its lifetime FAIL count exceeds this number, so `0` quarantines
    /// on the first failure.
    #[serde(
        default = "default_max_number_of_retries",
        alias = "maxNumberOfRetries"
    )]
    pub max_number_of_retries: u32,
}

fn default_max_number_of_retries() -> u32 {
    DEFAULT_MAX_NUMBER_OF_RETRIES
}

impl Default for ErrorSection {
    fn default() -> Self {
        Self {
            max_number_of_retries: default_max_number_of_retries(),
        }
    }
}

/// Top-level file read by the `commander` binary, before validation.
///
/// ```toml
/// [error]
/// max_number_of_retries = 2
///
/// [[command]]
/// id = "fetch"
/// cmd = "curl -fsS https://example.com"
///
/// [[command]]
/// id = "build"
/// cmd = "make"
/// ```
///
/// Commands are submitted in file order.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub error: ErrorSection,

    #[serde(default)]
    pub command: Vec<CommandSpec>,
}

/// One `[[command]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    /// Identifier shown in snapshots and logs. Need not be unique.
    pub id: String,
    /// Shell command line to run.
    pub cmd: String,
}

/// Validated configuration file. Build it with `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub commander: CommanderConfig,
    pub commands: Vec<CommandSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(error: ErrorSection, commands: Vec<CommandSpec>) -> Self {
        Self {
            commander: CommanderConfig { error },
            commands,
        }
    }
}
