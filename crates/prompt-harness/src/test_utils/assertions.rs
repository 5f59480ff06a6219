//! Assertion helpers for scenario failures.

use regex::Regex;

use crate::error::HarnessError;
use crate::report::RecordingReporter;

/// Assertions over recorded scenario failures.
pub trait FailureAssertions {
    /// Get every failure message.
    fn failure_messages(&self) -> Vec<String>;

    /// Assert that nothing failed.
    fn assert_clean(&self) {
        let failures = self.failure_messages();
        assert!(
            failures.is_empty(),
            "Expected no failures, but got:\n{}",
            failures.join("\n")
        );
    }

    /// Assert the number of failures.
    fn assert_failure_count(&self, expected: usize) {
        let failures = self.failure_messages();
        assert_eq!(
            failures.len(),
            expected,
            "Expected {expected} failures, but got:\n{}",
            failures.join("\n")
        );
    }

    /// Assert that some failure contains a literal string.
    fn assert_failure_contains(&self, needle: &str) {
        let failures = self.failure_messages();
        assert!(
            failures.iter().any(|f| f.contains(needle)),
            "Expected a failure containing {needle:?}, but got:\n{}",
            failures.join("\n")
        );
    }

    /// Assert that some failure matches a regex pattern.
    fn assert_failure_matches(&self, pattern: &str) {
        let failures = self.failure_messages();
        let re = Regex::new(pattern).expect("Invalid regex pattern");
        assert!(
            failures.iter().any(|f| re.is_match(f)),
            "Expected a failure matching {pattern:?}, but got:\n{}",
            failures.join("\n")
        );
    }
}

impl FailureAssertions for RecordingReporter {
    fn failure_messages(&self) -> Vec<String> {
        self.failures()
    }
}

impl FailureAssertions for HarnessError {
    fn failure_messages(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Assert that an error message contains a literal string.
pub fn assert_error_contains(error: &HarnessError, needle: &str) {
    error.assert_failure_contains(needle);
}

/// Assert that an error message matches a regex pattern.
pub fn assert_error_matches(error: &HarnessError, pattern: &str) {
    error.assert_failure_matches(pattern);
}
