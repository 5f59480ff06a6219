//! Configuration loading from files and environment readers.

use std::io::Write;
use std::time::Duration;

use prompt_harness::config::env::EnvConfig;
use prompt_harness::{HarnessConfig, HarnessError};

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "settle_ms = 25").unwrap();
    writeln!(file, "poll_ms = 5").unwrap();
    writeln!(file, "console_capacity = 1024").unwrap();

    let config = HarnessConfig::from_file(file.path()).unwrap();
    assert_eq!(config.settle_interval, Duration::from_millis(25));
    assert_eq!(config.poll_interval, Duration::from_millis(5));
    assert_eq!(config.console_capacity, 1024);
    assert_eq!(config.ask_timeout, HarnessConfig::default().ask_timeout);
}

#[test]
fn empty_file_gives_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    assert_eq!(
        HarnessConfig::from_file(file.path()).unwrap(),
        HarnessConfig::default()
    );
}

#[test]
fn zero_values_are_rejected() {
    for source in ["poll_ms = 0", "ask_timeout_ms = 0", "console_capacity = 0"] {
        let err = HarnessConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }), "{source}: {err}");
    }
}

#[test]
fn zero_settle_is_allowed() {
    let config = HarnessConfig::from_toml_str("settle_ms = 0").unwrap();
    assert_eq!(config.settle_interval, Duration::ZERO);
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = HarnessConfig::from_toml_str("settle_ms = \"soon\"").unwrap_err();
    assert!(matches!(err, HarnessError::Config { .. }));
}

#[test]
fn unset_prefix_reads_nothing() {
    let env = EnvConfig::new("PROMPT_HARNESS_CONFIG_TESTS_UNUSED");
    assert!(env.get("SETTLE_MS").is_none());
    assert!(env.duration_millis("SETTLE_MS").is_none());
}
