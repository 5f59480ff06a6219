//! Step vocabulary for registering expectations from scenario text.
//!
//! Each step phrase names a prompt kind, its message and the resolution, for
//! example:
//!
//! ```text
//! Then I see a confirm prompt "Continue?", I answer yes
//! Then I see another password prompt "Enter password:", I answer "secret"
//! Then I get a multiline prompt "Notes", I answer:
//!     """
//!     first line
//!     second line
//!     """
//! ```
//!
//! [`parse`] turns such text into an [`Expectation`];
//! [`Manager::run_step`](crate::Manager::run_step) queues it on the current
//! scenario.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{HarnessError, Result};
use crate::expectation::{Expectation, PromptKind, Resolution};

/// Leading part shared by every step: "get(s)/see(s) a(nother)".
const SUBJECT: &str = r"(?:(?:get)|(?:see))s? a(?:nother)? ";

/// How a step resolves the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Yes,
    No,
    Quoted,
    DocString,
    Interrupt,
    Help,
}

#[derive(Debug)]
struct StepDef {
    pattern: Regex,
    kind: PromptKind,
    reply: Reply,
}

/// Phrase tails in match order; the first matching step wins.
const VOCABULARY: &[(PromptKind, &str, Reply)] = &[
    (PromptKind::Confirm, r".* answers? yes", Reply::Yes),
    (PromptKind::Confirm, r".* answers? no", Reply::No),
    (PromptKind::Confirm, r#".* answers? "([^"]*)""#, Reply::Quoted),
    (PromptKind::Confirm, r".* interrupts?", Reply::Interrupt),
    (PromptKind::Confirm, r#".* asks? for help and sees? "([^"]*)""#, Reply::Help),
    (PromptKind::Multiline, r#".* answers? "([^"]*)""#, Reply::Quoted),
    (PromptKind::Multiline, r".* answers?:", Reply::DocString),
    (PromptKind::Multiline, r".* interrupts?", Reply::Interrupt),
    (PromptKind::Password, r#".* answers? "([^"]*)""#, Reply::Quoted),
    (PromptKind::Password, r".* interrupts?", Reply::Interrupt),
    (PromptKind::Password, r#".* asks? for help and sees? "([^"]*)""#, Reply::Help),
];

static STEPS: LazyLock<Vec<StepDef>> = LazyLock::new(|| {
    VOCABULARY
        .iter()
        .map(|&(kind, tail, reply)| StepDef {
            pattern: Regex::new(&format!(r#"{SUBJECT}{kind} prompt "([^"]*)"{tail}"#))
                .expect("step vocabulary patterns are valid regexes"),
            kind,
            reply,
        })
        .collect()
});

/// Get every step pattern in match order.
#[must_use]
pub fn patterns() -> Vec<&'static str> {
    STEPS.iter().map(|step| step.pattern.as_str()).collect()
}

/// Turn step text into an expectation.
///
/// `doc_string` is the block attached to the step, used by the multiline
/// `answers:` form.
///
/// # Errors
///
/// Returns [`HarnessError::UndefinedStep`] when no pattern matches, or
/// [`HarnessError::MissingDocString`] when a doc string step has none.
pub fn parse(text: &str, doc_string: Option<&str>) -> Result<Expectation> {
    for step in STEPS.iter() {
        let Some(captures) = step.pattern.captures(text) else {
            continue;
        };

        let message = capture(&captures, 1);
        let resolution = match step.reply {
            Reply::Yes => Resolution::answer("yes"),
            Reply::No => Resolution::answer("no"),
            Reply::Quoted => Resolution::answer(capture(&captures, 2)),
            Reply::DocString => match doc_string {
                Some(content) => Resolution::answer(content),
                None => {
                    return Err(HarnessError::MissingDocString {
                        text: text.to_string(),
                    });
                }
            },
            Reply::Interrupt => Resolution::Interrupt,
            Reply::Help => Resolution::help(capture(&captures, 2)),
        };

        return Ok(Expectation::new(step.kind, message, resolution));
    }

    Err(HarnessError::undefined_step(text))
}

fn capture<'t>(captures: &Captures<'t>, group: usize) -> &'t str {
    captures.get(group).map_or("", |m| m.as_str())
}
