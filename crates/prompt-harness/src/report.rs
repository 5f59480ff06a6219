//! Failure reporting sinks.
//!
//! The registry never panics on its own; it hands failures to a
//! [`Reporter`], which decides how the enclosing test run sees them. Driver
//! failures are collected at teardown, so reporters are always called from
//! the task that tears the scenario down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives scenario failures.
pub trait Reporter: Send + Sync {
    /// Record a failure message.
    fn report_failure(&self, message: &str);

    /// Stop the failing scenario.
    ///
    /// Called after [`Reporter::report_failure`] when a session driver failed.
    fn fatal_abort(&self);
}

/// Reporter that fails the running test.
///
/// Every failure is logged, then raised as a panic on the task running the
/// teardown, which is normally the test itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicReporter;

impl Reporter for PanicReporter {
    fn report_failure(&self, message: &str) {
        tracing::error!(%message, "scenario failure");
        panic!("{message}");
    }

    fn fatal_abort(&self) {
        panic!("scenario aborted after a session driver failure");
    }
}

/// Reporter that keeps every failure for later inspection.
///
/// Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    failures: Arc<Mutex<Vec<String>>>,
    aborted: Arc<AtomicBool>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded failure messages.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get all failure messages joined by newlines.
    #[must_use]
    pub fn failure_text(&self) -> String {
        self.failures().join("\n")
    }

    /// Check if nothing was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Check if an abort was requested.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.aborted.store(false, Ordering::SeqCst);
    }
}

impl Reporter for RecordingReporter {
    fn report_failure(&self, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn fatal_abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report_failure(&self, message: &str) {
        (**self).report_failure(message);
    }

    fn fatal_abort(&self) {
        (**self).fatal_abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reporter_collects() {
        let reporter = RecordingReporter::new();
        let shared = reporter.clone();

        assert!(reporter.is_clean());
        shared.report_failure("first");
        shared.report_failure("second");
        shared.fatal_abort();

        assert_eq!(reporter.failures(), ["first", "second"]);
        assert_eq!(reporter.failure_text(), "first\nsecond");
        assert!(reporter.aborted());

        reporter.clear();
        assert!(reporter.is_clean());
        assert!(!reporter.aborted());
    }

    #[test]
    #[should_panic(expected = "scenario aborted")]
    fn panic_reporter_panics_on_abort() {
        PanicReporter.fatal_abort();
    }

    #[test]
    #[should_panic(expected = "in scenario \"A\", boom")]
    fn panic_reporter_panics_on_failure() {
        PanicReporter.report_failure("in scenario \"A\", boom");
    }
}
