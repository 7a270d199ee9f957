// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CommanderError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CommanderError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.error, raw.command))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_command_fields(cfg)?;
    warn_duplicate_ids(cfg);
    Ok(())
}

fn validate_command_fields(cfg: &RawConfigFile) -> Result<()> {
    for (idx, entry) in cfg.command.iter().enumerate() {
        if entry.id.trim().is_empty() {
            return Err(CommanderError::ConfigError(format!(
                "[[command]] #{} has an empty `id`",
                idx + 1
            )));
        }
        if entry.cmd.trim().is_empty() {
            return Err(CommanderError::ConfigError(format!(
                "command '{}' has an empty `cmd`",
                entry.id
            )));
        }
    }
    Ok(())
}

// Ids are only used for observation, so duplicates are allowed but usually
// a copy-paste mistake.
fn warn_duplicate_ids(cfg: &RawConfigFile) {
    let mut seen = HashSet::new();
    for entry in cfg.command.iter() {
        if !seen.insert(entry.id.as_str()) {
            warn!(command = %entry.id, "duplicate command id in config");
        }
    }
}
