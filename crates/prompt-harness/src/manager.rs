//! Scenario registry.
//!
//! The [`Manager`] maps scenario ids to their [`Session`], starts a driver
//! for each new scenario and checks at teardown that every expectation was
//! met and that the driver did not fail. It is meant to be called from a
//! test framework's before/after scenario hooks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;

use crate::config::HarnessConfig;
use crate::console::{Console, Tty, console_pair};
use crate::error::{HarnessError, Result};
use crate::expectation::{Expectation, PromptKind, Resolution};
use crate::report::{PanicReporter, Reporter};
use crate::session::Session;
use crate::steps;

/// A test scenario as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scenario {
    id: String,
    name: String,
}

impl Scenario {
    /// Create a scenario with a unique id and a display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Get the scenario id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Callback run once a scenario's console is ready.
///
/// Receives the prompt-side end of the console.
pub type Starter = Arc<dyn Fn(&Scenario, &Tty) + Send + Sync>;

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<String, Session>,
    /// Sessions replaced by a duplicate start, checked at the scenario's
    /// teardown.
    retired: Vec<Session>,
    current: Option<String>,
}

/// Registry of active scenario sessions.
pub struct Manager {
    state: Mutex<RegistryState>,
    starters: Vec<Starter>,
    reporter: Arc<dyn Reporter>,
    config: HarnessConfig,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("state", &self.state)
            .field("starters", &self.starters.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// Create a registry with default configuration and a panicking reporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            starters: Vec::new(),
            reporter: Arc::new(PanicReporter),
            config: HarnessConfig::default(),
        }
    }

    /// Add a starter hook. Hooks run in registration order.
    #[must_use]
    pub fn with_starter<F>(mut self, starter: F) -> Self
    where
        F: Fn(&Scenario, &Tty) + Send + Sync + 'static,
    {
        self.starters.push(Arc::new(starter));
        self
    }

    /// Set the failure reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session for `scenario` on `console`.
    ///
    /// The new session becomes current. Starter hooks receive `tty`, then the
    /// driver is spawned on the current tokio runtime. A session already
    /// registered under the same id is closed and replaced; its expectations
    /// are still checked when the scenario is torn down.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoRuntime`] outside a tokio runtime.
    pub fn start<C: Console>(&self, scenario: &Scenario, console: C, tty: &Tty) -> Result<Session> {
        let runtime = Handle::try_current().map_err(|_| HarnessError::NoRuntime)?;
        let session = Session::new(scenario.clone());

        {
            let mut state = self.lock_state();
            if let Some(previous) = state
                .sessions
                .insert(scenario.id().to_string(), session.clone())
            {
                tracing::warn!(
                    scenario = %scenario.name(),
                    id = %scenario.id(),
                    "replacing a session that was never closed"
                );
                previous.close();
                state.retired.push(previous);
            }
            state.current = Some(scenario.id().to_string());
        }

        for starter in &self.starters {
            starter(scenario, tty);
        }

        session.spawn_driver(&runtime, console, self.config.poll_interval);

        tracing::debug!(scenario = %scenario.name(), id = %scenario.id(), "session started");
        Ok(session)
    }

    /// Tear down the session for `scenario` and return what went wrong.
    ///
    /// Closes the gate, waits for the settle interval (or until the queue
    /// drains), collects the driver and checks the expectations. Sessions
    /// replaced by a duplicate start are checked the same way, first.
    /// Unknown or already closed scenarios are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InScenario`] wrapping either the unmet
    /// expectations or a [`HarnessError::DriverFailed`], or
    /// [`HarnessError::Multiple`] when several sessions failed.
    pub async fn teardown(&self, scenario: &Scenario) -> Result<()> {
        let sessions = {
            let mut state = self.lock_state();
            let (mut sessions, kept): (Vec<Session>, Vec<Session>) =
                std::mem::take(&mut state.retired)
                    .into_iter()
                    .partition(|session| session.scenario().id() == scenario.id());
            state.retired = kept;

            if let Some(session) = state.sessions.remove(scenario.id()) {
                session.close();
                sessions.push(session);
            }
            if state.current.as_deref() == Some(scenario.id()) {
                state.current = None;
            }
            sessions
        };

        let mut errors = Vec::new();
        for session in &sessions {
            if let Err(err) = self.settle(session).await {
                errors.push(err.in_scenario(session.scenario().name()));
            }
        }

        if !sessions.is_empty() {
            tracing::debug!(scenario = %scenario.name(), sessions = sessions.len(), "session closed");
        }

        if errors.len() > 1 {
            return Err(HarnessError::Multiple { errors });
        }
        errors.pop().map_or(Ok(()), Err)
    }

    async fn settle(&self, session: &Session) -> Result<()> {
        session.wait_settled(self.config.settle_interval).await;

        match session.join_driver(self.config.ask_timeout).await {
            Ok(()) => session.expectations_were_met(),
            Err(err) => Err(HarnessError::driver_failed(err, session.remaining())),
        }
    }

    /// Tear down the session for `scenario`, reporting any failure.
    ///
    /// A failed driver is followed by [`Reporter::fatal_abort`].
    pub async fn close(&self, scenario: &Scenario) {
        if let Err(err) = self.teardown(scenario).await {
            self.reporter.report_failure(&err.to_string());
            if err.is_driver_failure() {
                self.reporter.fatal_abort();
            }
        }
    }

    /// Allocate an in-memory console and start a session on it.
    ///
    /// Returns the prompt-side end of the console.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoRuntime`] outside a tokio runtime.
    pub fn before_scenario(&self, scenario: &Scenario) -> Result<Tty> {
        let (console, tty) = console_pair(self.config.console_capacity);
        self.start(scenario, console, &tty)?;
        Ok(tty)
    }

    /// End a scenario started with [`Manager::before_scenario`].
    ///
    /// `error` is the scenario's own failure, if any; teardown happens either
    /// way.
    pub async fn after_scenario(
        &self,
        scenario: &Scenario,
        error: Option<&(dyn std::error::Error + Send + Sync)>,
    ) {
        if let Some(error) = error {
            tracing::debug!(scenario = %scenario.name(), %error, "scenario failed");
        }
        self.close(scenario).await;
    }

    /// Get the current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        let state = self.lock_state();
        state
            .current
            .as_ref()
            .and_then(|id| state.sessions.get(id))
            .cloned()
    }

    /// Get the current session or a usage error.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when no scenario is current.
    pub fn require_current(&self) -> Result<Session> {
        self.current().ok_or(HarnessError::NoActiveScenario)
    }

    /// Get the session registered under `id`.
    #[must_use]
    pub fn session(&self, id: &str) -> Option<Session> {
        self.lock_state().sessions.get(id).cloned()
    }

    /// Get the ids of all active scenarios, sorted.
    #[must_use]
    pub fn active_scenarios(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_state().sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Queue an expectation on the current scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when no scenario is current
    /// and [`HarnessError::UnsupportedHelp`] for a help resolution on a
    /// multiline prompt.
    pub fn expect(&self, kind: PromptKind, message: &str, resolution: Resolution) -> Result<()> {
        let session = self.require_current()?;
        queue_on(&session, Expectation::new(kind, message, resolution))
    }

    /// Queue an expectation on the scenario registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ScenarioNotFound`] when `id` is not active.
    pub fn expect_in(
        &self,
        id: &str,
        kind: PromptKind,
        message: &str,
        resolution: Resolution,
    ) -> Result<()> {
        let session = self
            .session(id)
            .ok_or_else(|| HarnessError::ScenarioNotFound { id: id.to_string() })?;
        queue_on(&session, Expectation::new(kind, message, resolution))
    }

    /// Expect a confirm prompt on the current scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when no scenario is current.
    pub fn expect_confirm(&self, message: &str, resolution: Resolution) -> Result<()> {
        self.expect(PromptKind::Confirm, message, resolution)
    }

    /// Expect a password prompt on the current scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when no scenario is current.
    pub fn expect_password(&self, message: &str, resolution: Resolution) -> Result<()> {
        self.expect(PromptKind::Password, message, resolution)
    }

    /// Expect a multiline prompt on the current scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NoActiveScenario`] when no scenario is current.
    pub fn expect_multiline(&self, message: &str, resolution: Resolution) -> Result<()> {
        self.expect(PromptKind::Multiline, message, resolution)
    }

    /// Run a step phrase against the current scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UndefinedStep`] for unknown text and
    /// [`HarnessError::NoActiveScenario`] when no scenario is current.
    pub fn run_step(&self, text: &str, doc_string: Option<&str>) -> Result<()> {
        let expectation = steps::parse(text, doc_string)?;
        let session = self.require_current()?;
        queue_on(&session, expectation)
    }
}

fn queue_on(session: &Session, expectation: Expectation) -> Result<()> {
    if matches!(expectation.resolution(), Resolution::Help { .. })
        && !expectation.kind().supports_help()
    {
        return Err(HarnessError::UnsupportedHelp {
            kind: expectation.kind(),
        });
    }
    session.push(expectation);
    Ok(())
}
