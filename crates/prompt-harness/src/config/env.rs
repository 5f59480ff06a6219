//! Environment-based configuration.

use std::time::Duration;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "PROMPT_HARNESS";

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        std::env::var(self.var_name(name)).ok()
    }

    /// Get a parsed value.
    ///
    /// Returns `Some(Err(raw))` when the variable is set but does not parse.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        self.get(name).map(|raw| raw.trim().parse().map_err(|_| raw))
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Result<Duration, String>> {
        self.parse::<u64>(name).map(|r| r.map(Duration::from_millis))
    }
}

/// Variables read by [`HarnessConfig::from_env`](super::HarnessConfig::from_env).
pub mod vars {
    /// Settle interval in milliseconds.
    pub const SETTLE_MS: &str = "SETTLE_MS";
    /// Ask timeout in milliseconds.
    pub const ASK_TIMEOUT_MS: &str = "ASK_TIMEOUT_MS";
    /// Driver poll interval in milliseconds.
    pub const POLL_MS: &str = "POLL_MS";
    /// In-memory console buffer capacity in bytes.
    pub const CONSOLE_CAPACITY: &str = "CONSOLE_CAPACITY";
}
