// tests/config_loading.rs

mod common;
use crate::common::builders::ConfigFileBuilder;

use std::io::Write;
use tempfile::NamedTempFile;

use commander::config::{
    load_and_validate, parse_str, CommanderConfig, ConfigFile, DEFAULT_MAX_NUMBER_OF_RETRIES,
};
use commander::errors::CommanderError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_commands_in_file_order() {
    let file = write_config(
        r#"
[error]
max_number_of_retries = 2

[[command]]
id = "zeta"
cmd = "echo z"

[[command]]
id = "alpha"
cmd = "echo a"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.commander.error.max_number_of_retries, 2);
    let ids: Vec<_> = cfg.commands.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["zeta", "alpha"]);
    assert_eq!(cfg.commands[1].cmd, "echo a");
}

#[test]
fn empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(
        cfg.commander.error.max_number_of_retries,
        DEFAULT_MAX_NUMBER_OF_RETRIES
    );
    assert!(cfg.commands.is_empty());
    assert_eq!(cfg.commander, CommanderConfig::default());
}

#[test]
fn camel_case_retry_key_is_accepted() {
    let raw = parse_str(
        r#"
[error]
maxNumberOfRetries = 7
"#,
    )
    .unwrap();

    assert_eq!(raw.error.max_number_of_retries, 7);
}

#[test]
fn commander_config_parses_on_its_own() {
    let cfg: CommanderConfig = toml::from_str("[error]\nmax_number_of_retries = 0\n").unwrap();
    assert_eq!(cfg, CommanderConfig::with_max_retries(0));
}

#[test]
fn negative_retry_budget_is_rejected() {
    let result = parse_str("[error]\nmax_number_of_retries = -1\n");
    assert!(matches!(result, Err(CommanderError::TomlError(_))));
}

#[test]
fn unknown_keys_are_rejected() {
    let result = parse_str("[error]\nmax_retries = 1\n");
    match result {
        Err(CommanderError::TomlError(e)) => {
            assert!(e.to_string().contains("max_retries"));
        }
        other => panic!("Expected TomlError, got: {other:?}"),
    }
}

#[test]
fn empty_cmd_returns_config_error() {
    let file = write_config(
        r#"
[[command]]
id = "blank"
cmd = "   "
"#,
    );

    match load_and_validate(file.path()) {
        Err(CommanderError::ConfigError(msg)) => {
            assert!(msg.contains("blank"));
            assert!(msg.contains("empty `cmd`"));
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_id_returns_config_error() {
    let raw = parse_str("[[command]]\nid = \"\"\ncmd = \"true\"\n").unwrap();

    match ConfigFile::try_from(raw) {
        Err(CommanderError::ConfigError(msg)) => assert!(msg.contains("#1")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn duplicate_ids_are_allowed() {
    let cfg = ConfigFileBuilder::new()
        .with_max_retries(1)
        .with_command("same", "true")
        .with_command("same", "false")
        .build();

    assert_eq!(cfg.commands.len(), 2);
    assert_eq!(cfg.commander.error.max_number_of_retries, 1);
}

#[test]
fn missing_file_is_io_error() {
    let result = load_and_validate("/definitely/not/here/Commander.toml");
    assert!(matches!(result, Err(CommanderError::IoError(_))));
}
