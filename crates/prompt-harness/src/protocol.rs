//! Prompt line protocol shared by the driver and the prompt side.
//!
//! A prompt is rendered as `? <message>` at the start of a line followed by a
//! kind hint. The answering side types the answer followed by a newline,
//! `?` + newline to request help, or Ctrl+C to interrupt.

use crate::expectation::PromptKind;

/// Marker that starts every prompt header.
pub const PROMPT_MARKER: &str = "? ";

/// Input that requests help.
pub const HELP_INPUT: &str = "?";

/// Byte sent to interrupt a prompt (Ctrl+C).
pub const INTERRUPT: u8 = 0x03;

/// Prefix of the line that shows help text.
pub const HELP_MARKER: &str = "ⓘ ";

/// Hint shown when help is available.
pub const HELP_HINT: &str = "[? for help]";

/// Hint shown by multiline prompts.
pub const MULTILINE_HINT: &str = "[Enter 2 empty lines to finish]";

/// Header text that identifies a prompt with the given message.
#[must_use]
pub fn header(message: &str) -> String {
    format!("{PROMPT_MARKER}{message}")
}

/// Render a full prompt line as the prompt side writes it.
#[must_use]
pub fn render(kind: PromptKind, message: &str, help: bool, default_yes: bool) -> String {
    let mut out = header(message);

    if help && kind.supports_help() {
        out.push(' ');
        out.push_str(HELP_HINT);
    }

    match kind {
        PromptKind::Confirm if default_yes => out.push_str(" (Y/n) "),
        PromptKind::Confirm => out.push_str(" (y/N) "),
        PromptKind::Multiline => {
            out.push(' ');
            out.push_str(MULTILINE_HINT);
            out.push(' ');
        }
        PromptKind::Password => out.push(' '),
    }

    out
}

/// Help text as it appears on its own line, marker included.
#[must_use]
pub fn help_line(help: &str) -> String {
    format!("{HELP_MARKER}{help}")
}

/// Render the help line for a prompt.
#[must_use]
pub fn render_help(help: &str) -> String {
    format!("\r\n{}\r\n", help_line(help))
}

/// Encode an answer as the keystrokes that type it.
#[must_use]
pub fn encode_answer(kind: PromptKind, answer: &str) -> Vec<u8> {
    let mut out = String::with_capacity(answer.len() + 3);

    match kind {
        PromptKind::Multiline => {
            if !answer.is_empty() {
                out.push_str(answer);
                out.push('\n');
            }
            out.push_str("\n\n");
        }
        PromptKind::Confirm | PromptKind::Password => {
            out.push_str(answer);
            out.push('\n');
        }
    }

    out.into_bytes()
}

/// Keystrokes that request help.
#[must_use]
pub fn help_request() -> Vec<u8> {
    format!("{HELP_INPUT}\n").into_bytes()
}

/// Parse a typed confirm answer.
///
/// An empty answer selects the default.
#[must_use]
pub fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Result of scanning console output for a prompt header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// The header was found; the value is the offset just past it.
    Found(usize),
    /// The header has not appeared yet.
    Pending,
    /// The live prompt line cannot become the header.
    Diverged(String),
}

/// What the text following a header says about the prompt kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hint {
    /// Not enough output yet.
    Incomplete,
    /// A lone space: a password prompt, or a longer hint still arriving.
    Space,
    /// The hint of a specific kind.
    Kind(PromptKind),
    /// The header is only a prefix of a longer message.
    Other,
}

fn classify_hint(rest: &str) -> Hint {
    let help = format!(" {HELP_HINT}");
    let hint = match rest.strip_prefix(help.as_str()) {
        Some(after) => after,
        None if rest.len() > 1 && help.starts_with(rest) => return Hint::Incomplete,
        None => rest,
    };

    let mut chars = hint.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Hint::Incomplete,
        (Some(' '), None) => Hint::Space,
        (Some(' '), Some('(')) => Hint::Kind(PromptKind::Confirm),
        (Some(' '), Some('[')) => Hint::Kind(PromptKind::Multiline),
        (Some(' '), Some(_)) => Hint::Kind(PromptKind::Password),
        (Some(_), _) => Hint::Other,
    }
}

/// The line of `buffer` starting at `at`, without its terminator.
fn line_at(buffer: &str, at: usize) -> &str {
    let line = &buffer[at..];
    line.find(['\n', '\r']).map_or(line, |end| &line[..end])
}

/// Look for the header of a `kind` prompt in `buffer`.
///
/// `at_line_start` tells whether `buffer[0]` begins a line. The hint after
/// the header must agree with `kind`: a live prompt of another kind
/// diverges. Only the trailing unterminated line is checked for
/// divergence; terminated lines are history.
#[must_use]
pub fn scan_header(buffer: &str, kind: PromptKind, header: &str, at_line_start: bool) -> Scan {
    let mut from = 0;
    while let Some(offset) = buffer[from..].find(header) {
        let at = from + offset;
        let end = at + header.len();
        let rest = line_at(buffer, end);
        let terminated = end + rest.len() < buffer.len();

        match classify_hint(rest) {
            Hint::Kind(found) if found == kind => return Scan::Found(end),
            Hint::Space if kind == PromptKind::Password => return Scan::Found(end),
            Hint::Kind(_) if !terminated => {
                return Scan::Diverged(line_at(buffer, at).to_string());
            }
            Hint::Space | Hint::Incomplete if !terminated => return Scan::Pending,
            _ => from = end,
        }
    }

    let live = match buffer.rfind(['\n', '\r']) {
        Some(at) => &buffer[at + 1..],
        None if at_line_start => buffer,
        None => return Scan::Pending,
    };

    if live.starts_with(PROMPT_MARKER) && !header.starts_with(live) {
        return Scan::Diverged(live.to_string());
    }

    Scan::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_kinds() {
        assert_eq!(
            render(PromptKind::Confirm, "Continue?", false, false),
            "? Continue? (y/N) "
        );
        assert_eq!(
            render(PromptKind::Confirm, "Continue?", true, true),
            "? Continue? [? for help] (Y/n) "
        );
        assert_eq!(
            render(PromptKind::Password, "Enter password:", false, false),
            "? Enter password: "
        );
        assert_eq!(
            render(PromptKind::Multiline, "Notes", true, false),
            "? Notes [Enter 2 empty lines to finish] "
        );
    }

    #[test]
    fn encode_multiline() {
        assert_eq!(encode_answer(PromptKind::Multiline, "a\nb"), b"a\nb\n\n\n");
        assert_eq!(encode_answer(PromptKind::Multiline, ""), b"\n\n");
        assert_eq!(encode_answer(PromptKind::Password, "pw"), b"pw\n");
    }

    #[test]
    fn confirm_parsing() {
        assert_eq!(parse_confirm("Yes", false), Some(true));
        assert_eq!(parse_confirm(" n ", true), Some(false));
        assert_eq!(parse_confirm("", true), Some(true));
        assert_eq!(parse_confirm("maybe", false), None);
    }

    #[test]
    fn scan_found_anywhere() {
        assert_eq!(
            scan_header("noise\n? Continue? (y/N) ", PromptKind::Confirm, "? Continue?", true),
            Scan::Found("noise\n? Continue?".len())
        );
    }

    #[test]
    fn scan_partial_is_pending() {
        assert_eq!(scan_header("? Cont", PromptKind::Confirm, "? Continue?", true), Scan::Pending);
        assert_eq!(scan_header("?", PromptKind::Confirm, "? Continue?", true), Scan::Pending);
    }

    #[test]
    fn scan_live_divergence() {
        assert_eq!(
            scan_header("? Name: ", PromptKind::Confirm, "? Continue?", true),
            Scan::Diverged("? Name: ".to_string())
        );
    }

    #[test]
    fn scan_ignores_terminated_history() {
        assert_eq!(
            scan_header("? Name: bob\r\n", PromptKind::Confirm, "? Continue?", true),
            Scan::Pending
        );
    }

    #[test]
    fn scan_ignores_continuation_of_old_line() {
        assert_eq!(scan_header("? for help] ", PromptKind::Confirm, "? Continue?", false), Scan::Pending);
    }

    #[test]
    fn scan_checks_kind_hint() {
        let header = "? Continue?";
        assert_eq!(
            scan_header("? Continue? (y/N) ", PromptKind::Password, header, true),
            Scan::Diverged("? Continue? (y/N) ".to_string())
        );
        assert_eq!(
            scan_header("? Continue? [? for help] (Y/n) ", PromptKind::Confirm, header, true),
            Scan::Found(header.len())
        );
        assert_eq!(
            scan_header("? Continue? [Enter 2 empty lines to finish] ", PromptKind::Confirm, header, true),
            Scan::Diverged("? Continue? [Enter 2 empty lines to finish] ".to_string())
        );
        assert_eq!(
            scan_header("? Continue? [? for help] ", PromptKind::Password, header, true),
            Scan::Found(header.len())
        );
    }

    #[test]
    fn scan_waits_for_split_hint() {
        let header = "? Continue?";
        assert_eq!(scan_header("? Continue?", PromptKind::Confirm, header, true), Scan::Pending);
        assert_eq!(scan_header("? Continue? ", PromptKind::Confirm, header, true), Scan::Pending);
        assert_eq!(scan_header("? Continue? [? f", PromptKind::Password, header, true), Scan::Pending);
        assert_eq!(scan_header("? Continue? ", PromptKind::Password, header, true), Scan::Found(header.len()));
    }

    #[test]
    fn scan_skips_longer_message() {
        assert_eq!(
            scan_header("? Continue?? (y/N) ", PromptKind::Confirm, "? Continue?", true),
            Scan::Diverged("? Continue?? (y/N) ".to_string())
        );
    }

    #[test]
    fn scan_skips_other_kind_in_history() {
        let buffer = "? Continue? (y/N) yes\r\n? Continue? ";
        assert_eq!(
            scan_header(buffer, PromptKind::Password, "? Continue?", true),
            Scan::Found(buffer.len() - 1)
        );
    }
}
