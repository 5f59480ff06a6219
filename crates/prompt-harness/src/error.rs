//! Error types for prompt-harness.
//!
//! This module defines all error types used throughout the library.
//! Errors carry enough context to debug a failed scenario from its failure
//! message alone: the scenario name, the prompt message and the expected
//! resolution.

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;

use crate::expectation::{Expectation, PromptKind};

/// Maximum length of a live prompt line to display in error messages.
const MAX_PROMPT_DISPLAY: usize = 200;

/// Truncate a line of console output for display.
fn format_prompt_snippet(line: &str) -> String {
    if line.is_empty() {
        return "(empty line)".to_string();
    }

    if line.len() <= MAX_PROMPT_DISPLAY {
        return format!("{line:?}");
    }

    let mut end = MAX_PROMPT_DISPLAY;
    while !line.is_char_boundary(end) {
        end -= 1;
    }

    format!("{:?}... ({} bytes hidden)", &line[..end], line.len() - end)
}

/// Format the unmet expectations in declared order.
fn format_unmet(remaining: &[Expectation]) -> String {
    let mut out = String::from("there are remaining expectations that were not met:\n");

    for expectation in remaining {
        out.push('\n');
        for line in expectation.to_string().lines() {
            let _ = writeln!(out, "    {line}");
        }
    }

    out.truncate(out.trim_end().len());
    out
}

/// Append the unmet expectations to a driver failure, when there are any.
fn format_also_unmet(remaining: &[Expectation]) -> String {
    if remaining.is_empty() {
        return String::new();
    }
    format!("\n\n{}", format_unmet(remaining))
}

fn format_all(errors: &[HarnessError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The main error type for prompt-harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The current expectation cannot make progress yet.
    ///
    /// Swallowed by the driver loop; never surfaced to the failure sink.
    #[error("nothing to do")]
    NothingToDo,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A prompt appeared that cannot be the expected one.
    #[error("unexpected prompt\n\nExpected: {expected}\nActual  : {}", format_prompt_snippet(actual))]
    UnexpectedPrompt {
        /// Rendering of the expectation that was being matched.
        expected: String,
        /// The live prompt line found on the console.
        actual: String,
    },

    /// The prompt side received a different answer than asserted.
    #[error("{kind} {message:?}: expected answer {expected}, got {actual}")]
    AnswerMismatch {
        /// The kind of prompt that was asked.
        kind: PromptKind,
        /// The prompt message.
        message: String,
        /// The answer the step asserted.
        expected: String,
        /// The answer actually received.
        actual: String,
    },

    /// The prompt was interrupted.
    #[error("prompt {message:?} was interrupted")]
    Interrupted {
        /// The prompt message.
        message: String,
    },

    /// Asking a prompt took longer than the configured deadline.
    #[error("ask timed out after {timeout:?} waiting for an answer to {message:?}")]
    AskTimeout {
        /// The prompt message.
        message: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The console closed while a prompt was waiting for input.
    #[error("console closed while waiting for an answer to {message:?}")]
    ConsoleClosed {
        /// The prompt message.
        message: String,
    },

    /// Expectations remained in the queue when the scenario ended.
    #[error("{}", format_unmet(remaining))]
    ExpectationsNotMet {
        /// Unmet expectations in declared order.
        remaining: Vec<Expectation>,
    },

    /// The session driver stopped with an error before the scenario ended.
    #[error("{source}{}", format_also_unmet(remaining))]
    DriverFailed {
        /// The error that ended the driver.
        #[source]
        source: Box<HarnessError>,
        /// Expectations still unmet when the driver was collected.
        remaining: Vec<Expectation>,
    },

    /// The session driver task panicked.
    #[error("session driver panicked: {message}")]
    DriverPanicked {
        /// The panic as reported by the runtime.
        message: String,
    },

    /// Several sessions of one scenario failed at teardown.
    #[error("{}", format_all(errors))]
    Multiple {
        /// The failures in teardown order.
        errors: Vec<HarnessError>,
    },

    /// An error scoped to a named scenario.
    #[error("in scenario {scenario:?}, {source}")]
    InScenario {
        /// The scenario name.
        scenario: String,
        /// The underlying error.
        #[source]
        source: Box<HarnessError>,
    },

    /// An expectation was registered while no scenario was active.
    #[error("no active scenario: expectations can only be registered between scenario start and end")]
    NoActiveScenario,

    /// Help was requested for a kind of prompt that has none.
    #[error("{kind} prompts have no help")]
    UnsupportedHelp {
        /// The prompt kind.
        kind: PromptKind,
    },

    /// No scenario is registered under the given id.
    #[error("scenario with id {id:?} not found")]
    ScenarioNotFound {
        /// The scenario id that was not found.
        id: String,
    },

    /// A session was started outside of a tokio runtime.
    #[error("a tokio runtime is required to start a scenario session")]
    NoRuntime,

    /// No step pattern matched the given text.
    #[error("undefined step: {text:?}")]
    UndefinedStep {
        /// The step text.
        text: String,
    },

    /// A step that takes a doc string was given none.
    #[error("step {text:?} requires a doc string")]
    MissingDocString {
        /// The step text.
        text: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type alias for prompt-harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Create an unexpected prompt error.
    pub fn unexpected_prompt(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UnexpectedPrompt {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an answer mismatch error.
    pub fn answer_mismatch(
        kind: PromptKind,
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AnswerMismatch {
            kind,
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an interrupted error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }

    /// Create an ask timeout error.
    pub fn ask_timeout(message: impl Into<String>, timeout: Duration) -> Self {
        Self::AskTimeout {
            message: message.into(),
            timeout,
        }
    }

    /// Create a console closed error.
    pub fn console_closed(message: impl Into<String>) -> Self {
        Self::ConsoleClosed {
            message: message.into(),
        }
    }

    /// Wrap this error with the scenario it happened in.
    #[must_use]
    pub fn in_scenario(self, scenario: impl Into<String>) -> Self {
        Self::InScenario {
            scenario: scenario.into(),
            source: Box::new(self),
        }
    }

    /// Create a driver failure carrying the expectations it left unmet.
    pub fn driver_failed(source: Self, remaining: Vec<Expectation>) -> Self {
        Self::DriverFailed {
            source: Box::new(source),
            remaining,
        }
    }

    /// Create an undefined step error.
    pub fn undefined_step(text: impl Into<String>) -> Self {
        Self::UndefinedStep { text: text.into() }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is the would-block sentinel.
    #[must_use]
    pub const fn is_nothing_to_do(&self) -> bool {
        matches!(self, Self::NothingToDo)
    }

    /// Check if this is an ask timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::AskTimeout { .. })
    }

    /// Check if this is an interrupted prompt.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Check if a session driver failed, as opposed to expectations
    /// merely being left unmet.
    #[must_use]
    pub fn is_driver_failure(&self) -> bool {
        match self {
            Self::DriverFailed { .. } | Self::DriverPanicked { .. } => true,
            Self::InScenario { source, .. } => source.is_driver_failure(),
            Self::Multiple { errors } => errors.iter().any(Self::is_driver_failure),
            _ => false,
        }
    }

    /// Get the unmet expectations if this error carries them.
    #[must_use]
    pub fn remaining(&self) -> Option<&[Expectation]> {
        match self {
            Self::ExpectationsNotMet { remaining } | Self::DriverFailed { remaining, .. } => {
                Some(remaining)
            }
            Self::InScenario { source, .. } => source.remaining(),
            Self::Multiple { errors } => errors.iter().find_map(Self::remaining),
            _ => None,
        }
    }
}
