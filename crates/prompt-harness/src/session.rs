//! Per-scenario sessions.
//!
//! A [`Session`] bundles the expectation queue and the stop [`Gate`] of one
//! scenario. The foreground appends expectations through the builders in
//! [`builder`]; a background [`Driver`] owns the console and consumes them.
//! A driver spawned through [`Session::spawn_driver`] is collected with
//! [`Session::join_driver`], which yields the error that ended it.
//!
//! # Example
//!
//! ```ignore
//! use prompt_harness::{Scenario, Session, console_pair};
//!
//! let session = Session::new(Scenario::new("1", "Checkout"));
//! let (console, tty) = console_pair(4096);
//! tokio::spawn(session.driver(console, std::time::Duration::from_millis(20)).run());
//!
//! session.expect_confirm("Continue?").yes();
//! // ... the prompt side asks through `tty` ...
//! session.close();
//! session.expectations_were_met()?;
//! ```

pub mod builder;
mod driver;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use crate::console::Console;
use crate::error::{HarnessError, Result};
use crate::expectation::{Expectation, Stage};
use crate::gate::Gate;
use crate::manager::Scenario;
use crate::queue::ExpectationQueue;

pub use builder::{ConfirmExpectation, MultilineExpectation, PasswordExpectation};
pub use driver::Driver;

/// The per-scenario bundle of expectation queue and stop gate.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    scenario: Scenario,
    queue: Mutex<ExpectationQueue>,
    gate: Gate,
    /// Woken when an expectation is queued.
    queued: Notify,
    /// Number of unmet expectations.
    progress: watch::Sender<usize>,
    driver: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Session {
    /// Create a session with an empty queue and an open gate.
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                scenario,
                queue: Mutex::new(ExpectationQueue::new()),
                gate: Gate::new(),
                queued: Notify::new(),
                progress: watch::channel(0).0,
                driver: Mutex::new(None),
            }),
        }
    }

    /// Get the scenario this session belongs to.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.inner.scenario
    }

    /// Check whether two handles refer to the same session.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Expect a confirm prompt with the given message.
    pub fn expect_confirm(&self, message: impl Into<String>) -> ConfirmExpectation<'_> {
        ConfirmExpectation::new(self, message.into())
    }

    /// Expect a password prompt with the given message.
    pub fn expect_password(&self, message: impl Into<String>) -> PasswordExpectation<'_> {
        PasswordExpectation::new(self, message.into())
    }

    /// Expect a multiline prompt with the given message.
    pub fn expect_multiline(&self, message: impl Into<String>) -> MultilineExpectation<'_> {
        MultilineExpectation::new(self, message.into())
    }

    /// Append an expectation to the queue.
    pub fn push(&self, expectation: Expectation) {
        tracing::trace!(
            scenario = %self.inner.scenario.name(),
            expectation = %expectation.summary(),
            "expectation queued"
        );

        let pending = {
            let mut queue = self.lock_queue();
            queue.push(expectation);
            queue.pending()
        };

        self.inner.progress.send_replace(pending);
        self.inner.queued.notify_one();
    }

    /// Close the gate, stopping the driver at its next iteration.
    ///
    /// Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        let closed = self.inner.gate.close();
        if closed {
            tracing::debug!(scenario = %self.inner.scenario.name(), "session gate closed");
        }
        closed
    }

    /// Check whether the gate is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.gate.is_closed()
    }

    /// Number of expectations not yet satisfied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock_queue().pending()
    }

    /// Unmet expectations in declared order.
    #[must_use]
    pub fn remaining(&self) -> Vec<Expectation> {
        self.lock_queue().remaining().to_vec()
    }

    /// Check that every queued expectation was satisfied.
    pub fn expectations_were_met(&self) -> Result<()> {
        self.lock_queue().expectations_were_met()
    }

    /// Wait until the queue is drained or `settle` elapses.
    ///
    /// Returns `true` if the queue drained in time.
    pub async fn wait_settled(&self, settle: Duration) -> bool {
        let mut progress = self.inner.progress.subscribe();
        tokio::time::timeout(settle, progress.wait_for(|pending| *pending == 0))
            .await
            .is_ok_and(|waited| waited.is_ok())
    }

    /// Create the driver that satisfies this session's expectations on `console`.
    #[must_use]
    pub fn driver<C: Console>(&self, console: C, poll_interval: Duration) -> Driver<C> {
        Driver::new(self.clone(), console, poll_interval)
    }

    /// Spawn the driver for `console` on `runtime` and keep its handle.
    pub fn spawn_driver<C: Console>(&self, runtime: &Handle, console: C, poll_interval: Duration) {
        let task = runtime.spawn(self.driver(console, poll_interval).run());
        let previous = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Wait for the spawned driver to stop and return its outcome.
    ///
    /// Meant to follow [`close`](Self::close). A driver still running after
    /// `grace` is aborted and counts as stopped. Without a spawned driver
    /// this returns `Ok(())` at once.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the driver, or
    /// [`HarnessError::DriverPanicked`] if its task panicked.
    pub async fn join_driver(&self, grace: Duration) -> Result<()> {
        let task = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut task) = task else {
            return Ok(());
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => Err(HarnessError::DriverPanicked {
                message: err.to_string(),
            }),
            Err(_) => {
                tracing::warn!(
                    scenario = %self.inner.scenario.name(),
                    ?grace,
                    "session driver did not stop in time"
                );
                task.abort();
                Ok(())
            }
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, ExpectationQueue> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn advance_front(&self, stage: Stage) {
        self.lock_queue().advance_front(stage);
    }

    pub(crate) fn satisfy_front(&self) {
        let pending = {
            let mut queue = self.lock_queue();
            if let Some(done) = queue.satisfy_front() {
                tracing::trace!(
                    scenario = %self.inner.scenario.name(),
                    expectation = %done.summary(),
                    "expectation satisfied"
                );
            }
            queue.pending()
        };
        self.inner.progress.send_replace(pending);
    }

    pub(crate) fn gate(&self) -> &Gate {
        &self.inner.gate
    }

    pub(crate) async fn queued(&self) {
        self.inner.queued.notified().await;
    }
}
