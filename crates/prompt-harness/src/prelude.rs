//! Convenient re-exports for common prompt-harness usage.
//!
//! ```ignore
//! use prompt_harness::prelude::*;
//! ```

pub use crate::config::HarnessConfig;
pub use crate::console::{Console, Tty, console_pair};
pub use crate::error::{HarnessError, Result};
pub use crate::expectation::{Expectation, PromptKind, Resolution};
pub use crate::manager::{Manager, Scenario};
pub use crate::report::{PanicReporter, RecordingReporter, Reporter};
pub use crate::session::Session;
