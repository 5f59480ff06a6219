//! The prompt-issuing side of a console.
//!
//! [`Prompter`] renders prompts on a [`Tty`] the way an interactive prompt
//! library would and reads back what the driver types. Its `*_step` methods
//! assert the received answer, so a scenario can check both ends.

use std::future::Future;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use regex::{Captures, Regex};

use crate::config::DEFAULT_ASK_TIMEOUT;
use crate::console::{Input, Tty};
use crate::error::{HarnessError, Result};
use crate::expectation::PromptKind;
use crate::manager::Scenario;
use crate::protocol;

/// Line written after each typed answer, as a terminal echoes Enter.
const ENTER_ECHO: &str = "\r\n";

/// Issues prompts on the current scenario's console.
///
/// Cheap to clone; clones share the console slot.
#[derive(Debug, Clone)]
pub struct Prompter {
    tty: Arc<Mutex<Option<Tty>>>,
    ask_timeout: Duration,
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter {
    /// Create a prompter with no console attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tty: Arc::new(Mutex::new(None)),
            ask_timeout: DEFAULT_ASK_TIMEOUT,
        }
    }

    /// Set the deadline for a single prompt.
    #[must_use]
    pub const fn with_ask_timeout(mut self, timeout: Duration) -> Self {
        self.ask_timeout = timeout;
        self
    }

    /// Attach a console.
    pub fn with_tty(&self, tty: Tty) {
        *self.tty.lock().unwrap_or_else(PoisonError::into_inner) = Some(tty);
    }

    /// Build a starter hook that attaches each new scenario's console.
    pub fn starter(&self) -> impl Fn(&Scenario, &Tty) + Send + Sync + 'static {
        let prompter = self.clone();
        move |_, tty| prompter.with_tty(tty.clone())
    }

    /// Get the attached console.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when nothing is attached.
    pub fn tty(&self) -> Result<Tty> {
        self.tty
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HarnessError::NoActiveScenario)
    }

    async fn ask<T, F>(&self, message: &str, prompt: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.ask_timeout, prompt)
            .await
            .map_err(|_| HarnessError::ask_timeout(message, self.ask_timeout))?
    }

    /// Ask a yes/no question. An empty answer means no.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Interrupted`] on Ctrl+C and
    /// [`HarnessError::AskTimeout`] when no answer arrives in time.
    pub async fn ask_confirm(&self, message: &str, help: Option<&str>) -> Result<bool> {
        let tty = self.tty()?;
        self.ask(message, confirm_loop(&tty, message, help)).await
    }

    /// Ask for a password.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Interrupted`] on Ctrl+C and
    /// [`HarnessError::AskTimeout`] when no answer arrives in time.
    pub async fn ask_password(&self, message: &str, help: Option<&str>) -> Result<String> {
        let tty = self.tty()?;
        self.ask(message, password_loop(&tty, message, help)).await
    }

    /// Ask for free text ending with two empty lines.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Interrupted`] on Ctrl+C and
    /// [`HarnessError::AskTimeout`] when no answer arrives in time.
    pub async fn ask_multiline(&self, message: &str) -> Result<String> {
        let tty = self.tty()?;
        self.ask(message, multiline_lines(&tty, message)).await
    }

    /// Ask a confirm prompt and check the answer.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AnswerMismatch`] when the answer differs.
    pub async fn confirm_step(&self, message: &str, help: Option<&str>, expected: bool) -> Result<()> {
        let answer = self.ask_confirm(message, help).await?;
        if answer != expected {
            return Err(HarnessError::answer_mismatch(
                PromptKind::Confirm,
                message,
                yes_no(expected),
                yes_no(answer),
            ));
        }
        Ok(())
    }

    /// Ask a password prompt and check the answer.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AnswerMismatch`] when the answer differs.
    pub async fn password_step(&self, message: &str, help: Option<&str>, expected: &str) -> Result<()> {
        let answer = self.ask_password(message, help).await?;
        if answer != expected {
            return Err(HarnessError::answer_mismatch(
                PromptKind::Password,
                message,
                expected,
                answer,
            ));
        }
        Ok(())
    }

    /// Ask a multiline prompt and check the answer.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AnswerMismatch`] when the answer differs.
    pub async fn multiline_step(&self, message: &str, expected: &str) -> Result<()> {
        let answer = self.ask_multiline(message).await?;
        if answer != expected {
            return Err(HarnessError::answer_mismatch(
                PromptKind::Multiline,
                message,
                expected,
                answer,
            ));
        }
        Ok(())
    }

    /// Ask a prompt of `kind` and check that it gets interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::AnswerMismatch`] when an answer arrives instead.
    pub async fn interrupted_step(&self, kind: PromptKind, message: &str) -> Result<()> {
        let answer = match kind {
            PromptKind::Confirm => self.ask_confirm(message, None).await.map(yes_no).map(String::from),
            PromptKind::Password => self.ask_password(message, None).await,
            PromptKind::Multiline => self.ask_multiline(message).await,
        };

        match answer {
            Err(err) if err.is_interrupted() => Ok(()),
            Err(err) => Err(err),
            Ok(answer) => Err(HarnessError::answer_mismatch(kind, message, "^C", answer)),
        }
    }

    /// Run a prompt-side step phrase such as
    /// `ask for confirm "Continue?", receive yes`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UndefinedStep`] for unknown text, otherwise the
    /// error of the matching step.
    pub async fn run_step(&self, text: &str, doc_string: Option<&str>) -> Result<()> {
        let Some((step, captures)) = PROMPT_STEPS
            .iter()
            .find_map(|(pattern, step)| pattern.captures(text).map(|c| (*step, c)))
        else {
            return Err(HarnessError::undefined_step(text));
        };

        let message = capture(&captures, 1);
        match step {
            PromptStep::ConfirmWithHelp(expected) => {
                self.confirm_step(message, Some(capture(&captures, 2)), expected)
                    .await
            }
            PromptStep::Confirm(expected) => self.confirm_step(message, None, expected).await,
            PromptStep::PasswordWithHelp => {
                self.password_step(message, Some(capture(&captures, 2)), capture(&captures, 3))
                    .await
            }
            PromptStep::Password => self.password_step(message, None, capture(&captures, 2)).await,
            PromptStep::Multiline => {
                let expected = doc_string.ok_or_else(|| HarnessError::MissingDocString {
                    text: text.to_string(),
                })?;
                self.multiline_step(message, expected).await
            }
            PromptStep::Interrupted(kind) => self.interrupted_step(kind, message).await,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PromptStep {
    ConfirmWithHelp(bool),
    Confirm(bool),
    PasswordWithHelp,
    Password,
    Multiline,
    Interrupted(PromptKind),
}

static PROMPT_STEPS: LazyLock<Vec<(Regex, PromptStep)>> = LazyLock::new(|| {
    [
        (r#"ask for confirm "([^"]*)" with help "([^"]*)", receive yes"#, PromptStep::ConfirmWithHelp(true)),
        (r#"ask for confirm "([^"]*)" with help "([^"]*)", receive no"#, PromptStep::ConfirmWithHelp(false)),
        (r#"ask for confirm "([^"]*)", receive yes"#, PromptStep::Confirm(true)),
        (r#"ask for confirm "([^"]*)", receive no"#, PromptStep::Confirm(false)),
        (r#"ask for confirm "([^"]*)", get interrupted"#, PromptStep::Interrupted(PromptKind::Confirm)),
        (r#"ask for multiline "([^"]*)", receive:"#, PromptStep::Multiline),
        (r#"ask for multiline "([^"]*)", get interrupted"#, PromptStep::Interrupted(PromptKind::Multiline)),
        (r#"ask for password "([^"]*)" with help "([^"]*)", receive "([^"]*)""#, PromptStep::PasswordWithHelp),
        (r#"ask for password "([^"]*)", receive "([^"]*)""#, PromptStep::Password),
        (r#"ask for password "([^"]*)", get interrupted"#, PromptStep::Interrupted(PromptKind::Password)),
    ]
    .into_iter()
    .map(|(pattern, step)| {
        (
            Regex::new(pattern).expect("prompt step patterns are valid regexes"),
            step,
        )
    })
    .collect()
});

fn capture<'t>(captures: &Captures<'t>, group: usize) -> &'t str {
    captures.get(group).map_or("", |m| m.as_str())
}

const fn yes_no(answer: bool) -> &'static str {
    if answer { "yes" } else { "no" }
}

async fn confirm_loop(tty: &Tty, message: &str, help: Option<&str>) -> Result<bool> {
    loop {
        let line = prompt_line(tty, PromptKind::Confirm, message, help).await?;
        if show_help(tty, help, &line).await? {
            continue;
        }
        if let Some(answer) = protocol::parse_confirm(&line, false) {
            return Ok(answer);
        }
        tty.write_str(&format!(
            "✘ Sorry, your reply was invalid: {line:?} is not a valid answer{ENTER_ECHO}"
        ))
        .await?;
    }
}

async fn password_loop(tty: &Tty, message: &str, help: Option<&str>) -> Result<String> {
    loop {
        let line = prompt_line(tty, PromptKind::Password, message, help).await?;
        if !show_help(tty, help, &line).await? {
            return Ok(line);
        }
    }
}

async fn multiline_lines(tty: &Tty, message: &str) -> Result<String> {
    tty.write_str(&protocol::render(PromptKind::Multiline, message, false, false))
        .await?;

    let mut lines = Vec::new();
    let mut empty_run = 0;
    while empty_run < 2 {
        let line = read_line(tty, message).await?;
        empty_run = if line.is_empty() { empty_run + 1 } else { 0 };
        lines.push(line);
    }
    tty.write_str(ENTER_ECHO).await?;

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    Ok(lines.join("\n"))
}

/// Render a prompt and read one line of input.
async fn prompt_line(tty: &Tty, kind: PromptKind, message: &str, help: Option<&str>) -> Result<String> {
    tty.write_str(&protocol::render(kind, message, help.is_some(), false))
        .await?;
    let line = read_line(tty, message).await?;
    tty.write_str(ENTER_ECHO).await?;
    Ok(line)
}

/// Print the help text if `line` asked for it.
async fn show_help(tty: &Tty, help: Option<&str>, line: &str) -> Result<bool> {
    match help {
        Some(help) if line == protocol::HELP_INPUT => {
            tty.write_str(&protocol::render_help(help)).await?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

async fn read_line(tty: &Tty, message: &str) -> Result<String> {
    match tty.read_input().await? {
        Input::Line(line) => Ok(line),
        Input::Interrupt => {
            tty.write_str(&format!("^C{ENTER_ECHO}")).await?;
            Err(HarnessError::interrupted(message))
        }
        Input::Eof => Err(HarnessError::console_closed(message)),
    }
}
