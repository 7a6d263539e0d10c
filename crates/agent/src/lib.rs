//! The orchestration loop: the heart of opsloop.
//!
//! The agent follows an **Ask → Act → Observe** cycle:
//!
//! 1. **Ask** the model for its next decision, sending the full transcript
//!    and the registry's action definitions
//! 2. **Act**: each requested action is validated, screened by the
//!    confirmation gate and executed, in the order the model gave them
//! 3. **Observe**: one observation per request is appended, then loop back
//!
//! The run ends when the model stops requesting actions for enough rounds
//! in a row, when an optional round cap is reached, or when the model call
//! itself fails.

pub mod executor;
pub mod gate;
pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use executor::ActionExecutor;
pub use gate::ConfirmationGate;
pub use loop_runner::{DEFAULT_IDLE_THRESHOLD, Orchestrator, RunReport, Termination};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, IDLE_REMINDER, system_prompt};
