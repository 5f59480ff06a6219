//! prompt-harness: ordered prompt expectations for behavior-driven terminal tests
//!
//! This crate lets a test scenario declare, in order, which interactive prompts
//! should appear on a console and how each one is answered. A background
//! driver per scenario watches the console and types the answers while the
//! test's own steps issue prompts and check what they received.
//!
//! # Features
//!
//! - **Ordered expectations** for confirm, password and multiline prompts
//! - **Help and interrupt flows** (`?` for help, Ctrl+C)
//! - **Scenario registry** that starts a driver per scenario and reports
//!   unmet expectations at teardown
//! - **Step vocabulary** for registering expectations from scenario text
//! - **Test utilities** with the prompt-issuing side (feature: `test-utils`)
//!
//! # Example
//!
//! ```ignore
//! use prompt_harness::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = Manager::new();
//!     let scenario = Scenario::new("1", "Checkout");
//!     let tty = manager.before_scenario(&scenario)?;
//!
//!     manager.run_step(r#"I see a confirm prompt "Continue?", I answer yes"#, None)?;
//!     // ... hand `tty` to the code that asks "Continue?" ...
//!
//!     manager.after_scenario(&scenario, None).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod expectation;
pub mod gate;
pub mod manager;
pub mod prelude;
pub mod protocol;
pub mod queue;
pub mod report;
pub mod session;
pub mod steps;

pub use config::HarnessConfig;
pub use console::{Console, Input, Tty, console_pair};
pub use error::{HarnessError, Result};
pub use expectation::{Expectation, PromptKind, Resolution, Stage};
pub use gate::Gate;
pub use manager::{Manager, Scenario, Starter};
pub use queue::ExpectationQueue;
pub use report::{PanicReporter, RecordingReporter, Reporter};
pub use session::{ConfirmExpectation, Driver, MultilineExpectation, PasswordExpectation, Session};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
