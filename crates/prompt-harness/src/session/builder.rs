//! Fluent builders for queuing expectations.
//!
//! Each builder is created by a `Session::expect_*` call and queues exactly
//! one expectation when its terminal method runs.

use crate::expectation::{Expectation, PromptKind, Resolution};

use super::Session;

/// Builder for an expected confirm prompt.
#[derive(Debug)]
#[must_use = "the expectation is only queued by a terminal method such as `yes()`"]
pub struct ConfirmExpectation<'a> {
    session: &'a Session,
    message: String,
}

impl<'a> ConfirmExpectation<'a> {
    pub(super) const fn new(session: &'a Session, message: String) -> Self {
        Self { session, message }
    }

    fn queue(self, resolution: Resolution) {
        self.session
            .push(Expectation::new(PromptKind::Confirm, self.message, resolution));
    }

    /// Answer `yes`.
    pub fn yes(self) {
        self.answer("yes");
    }

    /// Answer `no`.
    pub fn no(self) {
        self.answer("no");
    }

    /// Type a custom answer.
    pub fn answer(self, answer: impl Into<String>) {
        self.queue(Resolution::answer(answer));
    }

    /// Interrupt with Ctrl+C.
    pub fn interrupt(self) {
        self.queue(Resolution::Interrupt);
    }

    /// Ask for help and expect the given help text.
    pub fn show_help(self, help: impl Into<String>) {
        self.queue(Resolution::help(help));
    }

    /// Ask for help, expect the help text, then answer.
    pub fn show_help_then(self, help: impl Into<String>, answer: impl Into<String>) {
        self.queue(Resolution::help_then(help, answer));
    }
}

/// Builder for an expected password prompt.
#[derive(Debug)]
#[must_use = "the expectation is only queued by a terminal method such as `answer()`"]
pub struct PasswordExpectation<'a> {
    session: &'a Session,
    message: String,
}

impl<'a> PasswordExpectation<'a> {
    pub(super) const fn new(session: &'a Session, message: String) -> Self {
        Self { session, message }
    }

    fn queue(self, resolution: Resolution) {
        self.session
            .push(Expectation::new(PromptKind::Password, self.message, resolution));
    }

    /// Type the password.
    pub fn answer(self, answer: impl Into<String>) {
        self.queue(Resolution::answer(answer));
    }

    /// Interrupt with Ctrl+C.
    pub fn interrupt(self) {
        self.queue(Resolution::Interrupt);
    }

    /// Ask for help and expect the given help text.
    pub fn show_help(self, help: impl Into<String>) {
        self.queue(Resolution::help(help));
    }

    /// Ask for help, expect the help text, then type the password.
    pub fn show_help_then(self, help: impl Into<String>, answer: impl Into<String>) {
        self.queue(Resolution::help_then(help, answer));
    }
}

/// Builder for an expected multiline prompt.
///
/// Multiline prompts have no help.
#[derive(Debug)]
#[must_use = "the expectation is only queued by a terminal method such as `answer()`"]
pub struct MultilineExpectation<'a> {
    session: &'a Session,
    message: String,
}

impl<'a> MultilineExpectation<'a> {
    pub(super) const fn new(session: &'a Session, message: String) -> Self {
        Self { session, message }
    }

    /// Type the text, then finish with two empty lines.
    pub fn answer(self, answer: impl Into<String>) {
        self.session.push(Expectation::new(
            PromptKind::Multiline,
            self.message,
            Resolution::answer(answer),
        ));
    }

    /// Interrupt with Ctrl+C.
    pub fn interrupt(self) {
        self.session.push(Expectation::new(
            PromptKind::Multiline,
            self.message,
            Resolution::Interrupt,
        ));
    }
}
