//! Expectations about upcoming interactive prompts.
//!
//! An [`Expectation`] names the kind of prompt, the message it shows and how
//! it should be resolved. Expectations are queued per scenario and satisfied
//! strictly in order by the session driver.

use std::fmt;

use crate::protocol;

/// The kind of interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// A yes/no question.
    Confirm,
    /// Free text spanning several lines.
    Multiline,
    /// Hidden single-line input.
    Password,
}

impl PromptKind {
    /// Human readable title used in failure reports.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Confirm => "Confirm Prompt",
            Self::Multiline => "Multiline Prompt",
            Self::Password => "Password Prompt",
        }
    }

    /// Whether this kind of prompt can show help text.
    #[must_use]
    pub const fn supports_help(self) -> bool {
        !matches!(self, Self::Multiline)
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Confirm => "confirm",
            Self::Multiline => "multiline",
            Self::Password => "password",
        };
        f.write_str(name)
    }
}

/// How an expected prompt gets resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Type the given answer.
    Answer(String),
    /// Interrupt the prompt with Ctrl+C.
    Interrupt,
    /// Ask for help, wait for the help text, then optionally answer.
    Help {
        /// Help text that must appear.
        help: String,
        /// Answer typed once the prompt is shown again.
        answer: Option<String>,
    },
}

impl Resolution {
    /// Create an answer resolution.
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer(text.into())
    }

    /// Create a help resolution without a follow-up answer.
    pub fn help(help: impl Into<String>) -> Self {
        Self::Help {
            help: help.into(),
            answer: None,
        }
    }

    /// Create a help resolution followed by an answer.
    pub fn help_then(help: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::Help {
            help: help.into(),
            answer: Some(answer.into()),
        }
    }
}

/// Progress of the expectation at the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Waiting for the prompt header.
    #[default]
    Prompt,
    /// Help was requested; waiting for the help text.
    Help,
    /// Help was shown; waiting for the prompt to be rendered again.
    Reprompt,
}

/// A single ordered assertion about an upcoming prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    kind: PromptKind,
    message: String,
    resolution: Resolution,
    stage: Stage,
    satisfied: bool,
}

impl Expectation {
    /// Create a new pending expectation.
    pub fn new(kind: PromptKind, message: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            kind,
            message: message.into(),
            resolution,
            stage: Stage::Prompt,
            satisfied: false,
        }
    }

    /// Get the prompt kind.
    #[must_use]
    pub const fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Get the prompt message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the expected resolution.
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Get the current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Check whether the expectation was satisfied.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// One-line summary used in unexpected prompt errors.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} {:?}", self.kind.title(), self.message)
    }

    /// Decide what to do next given the buffered console output.
    ///
    /// Returns the action plus the number of bytes of `buffer` it consumed.
    pub(crate) fn next_action(&self, buffer: &str, at_line_start: bool) -> (Action, usize) {
        match self.stage {
            Stage::Prompt | Stage::Reprompt => {
                let header = protocol::header(&self.message);
                match protocol::scan_header(buffer, self.kind, &header, at_line_start) {
                    protocol::Scan::Found(end) => (self.on_prompt(), end),
                    protocol::Scan::Pending => (Action::Wait, 0),
                    protocol::Scan::Diverged(line) => (Action::Unexpected(line), 0),
                }
            }
            Stage::Help => {
                let Resolution::Help { help, answer } = &self.resolution else {
                    return (Action::Wait, 0);
                };
                let line = protocol::help_line(help);
                match buffer.find(line.as_str()) {
                    Some(at) => {
                        let next = if answer.is_some() {
                            Action::Advance(Stage::Reprompt)
                        } else {
                            Action::Complete(None)
                        };
                        (next, at + line.len())
                    }
                    None => (Action::Wait, 0),
                }
            }
        }
    }

    fn on_prompt(&self) -> Action {
        match (&self.resolution, self.stage) {
            (Resolution::Answer(answer), _) => {
                Action::Complete(Some(protocol::encode_answer(self.kind, answer)))
            }
            (Resolution::Interrupt, _) => Action::Complete(Some(vec![protocol::INTERRUPT])),
            (Resolution::Help { .. }, Stage::Prompt) => Action::Send {
                input: protocol::help_request(),
                next: Stage::Help,
            },
            (Resolution::Help { answer, .. }, _) => Action::Complete(
                answer
                    .as_deref()
                    .map(|answer| protocol::encode_answer(self.kind, answer)),
            ),
        }
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn mark_satisfied(&mut self) {
        self.satisfied = true;
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expect : {}", self.kind.title())?;
        write!(f, "Message: {:?}", self.message)?;

        match &self.resolution {
            Resolution::Answer(answer) => write!(f, "\nAnswer : {answer:?}"),
            Resolution::Interrupt => write!(f, "\nAnswer : ^C"),
            Resolution::Help { help, answer } => {
                write!(f, "\nHelp   : {help:?}")?;
                match answer {
                    Some(answer) => write!(f, "\nAnswer : {answer:?}"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// What the driver should do for the front expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// More output is needed.
    Wait,
    /// Write input and move to another stage.
    Send {
        /// Bytes to write to the console.
        input: Vec<u8>,
        /// Stage after the write.
        next: Stage,
    },
    /// Move to another stage without writing.
    Advance(Stage),
    /// Optionally write input, then mark the expectation satisfied.
    Complete(Option<Vec<u8>>),
    /// The live prompt line cannot be the expected one.
    Unexpected(String),
}
