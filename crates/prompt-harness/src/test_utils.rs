//! Test utilities for prompt-harness.
//!
//! This module provides the prompt-issuing side of a console, scripted
//! scenarios and assertion helpers for tests that drive prompts end to end.

mod assertions;
mod logging;
mod prompter;
mod runner;

pub use assertions::{FailureAssertions, assert_error_contains, assert_error_matches};
pub use logging::init_test_logging;
pub use prompter::Prompter;
pub use runner::{ScenarioRunner, Step};
