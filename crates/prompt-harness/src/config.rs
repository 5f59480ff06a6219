//! Configuration for prompt-harness.
//!
//! [`HarnessConfig`] holds the timing knobs shared by the scenario registry,
//! the session drivers and the prompt side. Values come from defaults,
//! environment variables or a TOML file.

pub mod env;

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HarnessError, Result};
use env::{EnvConfig, vars};

/// Default grace period before checking expectations at teardown.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Default deadline for a prompt round trip.
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(1);

/// Default upper bound on a single driver wait.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Default in-memory console buffer size.
pub const DEFAULT_CONSOLE_CAPACITY: usize = 4096;

/// Timing and sizing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// How long teardown waits for in-flight matches before checking.
    pub settle_interval: Duration,

    /// Deadline for the prompt side to receive an answer.
    pub ask_timeout: Duration,

    /// Upper bound on a single driver wait before it re-checks the gate.
    pub poll_interval: Duration,

    /// Buffer size of consoles created by the registry.
    pub console_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            ask_timeout: DEFAULT_ASK_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            console_capacity: DEFAULT_CONSOLE_CAPACITY,
        }
    }
}

impl HarnessConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the settle interval.
    #[must_use]
    pub const fn settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    /// Set the ask timeout.
    #[must_use]
    pub const fn ask_timeout(mut self, timeout: Duration) -> Self {
        self.ask_timeout = timeout;
        self
    }

    /// Set the driver poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the console capacity.
    #[must_use]
    pub const fn console_capacity(mut self, capacity: usize) -> Self {
        self.console_capacity = capacity;
        self
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(HarnessError::config("poll interval must be greater than zero"));
        }
        if self.ask_timeout.is_zero() {
            return Err(HarnessError::config("ask timeout must be greater than zero"));
        }
        if self.console_capacity == 0 {
            return Err(HarnessError::config("console capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Build a configuration from `PROMPT_HARNESS_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(&EnvConfig::default())
    }

    /// Build a configuration from environment variables with a custom reader.
    pub fn from_env_with(env: &EnvConfig) -> Result<Self> {
        let invalid = |name: &str, raw: String| {
            HarnessError::config(format!("invalid value {raw:?} for {name}"))
        };

        let mut config = Self::default();

        if let Some(value) = env.duration_millis(vars::SETTLE_MS) {
            config.settle_interval = value.map_err(|raw| invalid(vars::SETTLE_MS, raw))?;
        }
        if let Some(value) = env.duration_millis(vars::ASK_TIMEOUT_MS) {
            config.ask_timeout = value.map_err(|raw| invalid(vars::ASK_TIMEOUT_MS, raw))?;
        }
        if let Some(value) = env.duration_millis(vars::POLL_MS) {
            config.poll_interval = value.map_err(|raw| invalid(vars::POLL_MS, raw))?;
        }
        if let Some(value) = env.parse::<usize>(vars::CONSOLE_CAPACITY) {
            config.console_capacity = value.map_err(|raw| invalid(vars::CONSOLE_CAPACITY, raw))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML.
    ///
    /// ```toml
    /// settle_ms = 50
    /// ask_timeout_ms = 2000
    /// poll_ms = 10
    /// console_capacity = 8192
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(source).map_err(|e| HarnessError::config(e.to_string()))?;
        let config = file.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = HarnessError::with_io_context(
            std::fs::read_to_string(path),
            format!("reading {}", path.display()),
        )?;
        Self::from_toml_str(&source)
    }
}

/// On-disk shape of the configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    settle_ms: Option<u64>,
    ask_timeout_ms: Option<u64>,
    poll_ms: Option<u64>,
    console_capacity: Option<usize>,
}

impl FileConfig {
    fn into_config(self) -> HarnessConfig {
        let defaults = HarnessConfig::default();
        HarnessConfig {
            settle_interval: self
                .settle_ms
                .map_or(defaults.settle_interval, Duration::from_millis),
            ask_timeout: self
                .ask_timeout_ms
                .map_or(defaults.ask_timeout, Duration::from_millis),
            poll_interval: self
                .poll_ms
                .map_or(defaults.poll_interval, Duration::from_millis),
            console_capacity: self.console_capacity.unwrap_or(defaults.console_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.ask_timeout, Duration::from_secs(1));
        assert_eq!(config.settle_interval, DEFAULT_SETTLE_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_setters() {
        let config = HarnessConfig::new()
            .settle_interval(Duration::from_millis(50))
            .poll_interval(Duration::from_millis(5))
            .console_capacity(128);
        assert_eq!(config.settle_interval, Duration::from_millis(50));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.console_capacity, 128);
    }

    #[test]
    fn zero_poll_is_invalid() {
        let config = HarnessConfig::new().poll_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(HarnessError::Config { .. })));
    }

    #[test]
    fn toml_partial() {
        let config = HarnessConfig::from_toml_str("settle_ms = 50\nask_timeout_ms = 2000\n").unwrap();
        assert_eq!(config.settle_interval, Duration::from_millis(50));
        assert_eq!(config.ask_timeout, Duration::from_secs(2));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = HarnessConfig::from_toml_str("settle = 5\n").unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn missing_file_has_context() {
        let err = HarnessConfig::from_file("/nonexistent/prompt-harness.toml").unwrap_err();
        assert!(err.to_string().contains("reading /nonexistent/prompt-harness.toml"));
    }

    #[test]
    fn env_reader_without_vars_gives_defaults() {
        let env = EnvConfig::new("PROMPT_HARNESS_TEST_UNSET_PREFIX");
        assert_eq!(HarnessConfig::from_env_with(&env).unwrap(), HarnessConfig::default());
    }
}
