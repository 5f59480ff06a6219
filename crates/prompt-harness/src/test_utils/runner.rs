//! Scripted scenarios that exercise both ends of a console.

use std::sync::Arc;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::manager::{Manager, Scenario};
use crate::report::RecordingReporter;

use super::prompter::Prompter;

/// One line of a scenario script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    text: String,
    doc_string: Option<String>,
}

impl Step {
    /// Create a step without a doc string.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            doc_string: None,
        }
    }

    /// Create a step with an attached doc string.
    pub fn with_doc_string(text: impl Into<String>, doc_string: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            doc_string: Some(doc_string.into()),
        }
    }
}

/// Runs scripted scenarios against a [`Manager`] and a [`Prompter`].
///
/// Expectation steps go to the manager; `ask for ...` steps go to the
/// prompter. Failures reported by the manager land in the recorder.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    manager: Arc<Manager>,
    prompter: Prompter,
    reporter: RecordingReporter,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl ScenarioRunner {
    /// Create a runner with the given configuration.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        let reporter = RecordingReporter::new();
        let prompter = Prompter::new().with_ask_timeout(config.ask_timeout);
        let manager = Manager::new()
            .with_config(config)
            .with_reporter(reporter.clone())
            .with_starter(prompter.starter());

        Self {
            manager: Arc::new(manager),
            prompter,
            reporter,
        }
    }

    /// Get the manager.
    #[must_use]
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Get the prompter.
    #[must_use]
    pub const fn prompter(&self) -> &Prompter {
        &self.prompter
    }

    /// Get the failure recorder.
    #[must_use]
    pub const fn reporter(&self) -> &RecordingReporter {
        &self.reporter
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// Returns the step's error, or [`HarnessError::UndefinedStep`] when
    /// neither side knows the text.
    pub async fn run_step(&self, step: &Step) -> Result<()> {
        let doc_string = step.doc_string.as_deref();
        match self.manager.run_step(&step.text, doc_string) {
            Err(HarnessError::UndefinedStep { .. }) => {
                self.prompter.run_step(&step.text, doc_string).await
            }
            other => other,
        }
    }

    /// Run a whole scenario: start, every step in order, then teardown.
    ///
    /// Stops at the first failing step; teardown runs either way and reports
    /// to the recorder.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn run(&self, scenario: &Scenario, steps: &[Step]) -> Result<()> {
        self.manager.before_scenario(scenario)?;

        let mut outcome = Ok(());
        for step in steps {
            if let Err(err) = self.run_step(step).await {
                tracing::debug!(scenario = %scenario.name(), step = %step.text, "step failed");
                outcome = Err(err);
                break;
            }
        }

        self.manager
            .after_scenario(
                scenario,
                outcome
                    .as_ref()
                    .err()
                    .map(|err| err as &(dyn std::error::Error + Send + Sync)),
            )
            .await;

        outcome
    }
}
