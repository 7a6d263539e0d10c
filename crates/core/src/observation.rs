//! Observations: the executor's reply to a single action request.
//!
//! Every request in a batch gets exactly one observation, whether the
//! action succeeded, was declined by the operator, or failed.

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ProtocolError};

/// Why a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownAction,
    InvalidArguments,
    Execution,
    Protocol,
}

/// Machine-readable outcome flag, independent of the display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Declined,
    Failed(FailureKind),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Declined => write!(f, "declined"),
            Outcome::Failed(FailureKind::UnknownAction) => write!(f, "unknown action"),
            Outcome::Failed(FailureKind::InvalidArguments) => write!(f, "invalid arguments"),
            Outcome::Failed(FailureKind::Execution) => write!(f, "execution error"),
            Outcome::Failed(FailureKind::Protocol) => write!(f, "protocol error"),
        }
    }
}

/// The result of handling one action request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The request this answers
    pub correlation_id: String,

    /// Outcome flag
    pub outcome: Outcome,

    /// Text shown to the model
    pub content: String,
}

impl Observation {
    pub fn success(correlation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            outcome: Outcome::Success,
            content: content.into(),
        }
    }

    /// The operator declined the action; nothing was executed.
    pub fn declined(correlation_id: impl Into<String>, action: &str) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            outcome: Outcome::Declined,
            content: format!("Skipped by operator: '{action}' was not approved, no changes were made."),
        }
    }

    pub fn failure(
        correlation_id: impl Into<String>,
        kind: FailureKind,
        message: impl std::fmt::Display,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            outcome: Outcome::Failed(kind),
            content: format!("Error: {message}"),
        }
    }

    /// Render an action failure, classifying it by variant.
    pub fn from_action_error(correlation_id: impl Into<String>, error: &ActionError) -> Self {
        let kind = match error {
            ActionError::UnknownAction(_) => FailureKind::UnknownAction,
            ActionError::InvalidArguments { .. } => FailureKind::InvalidArguments,
            ActionError::DuplicateAction(_)
            | ActionError::ExecutionFailed { .. }
            | ActionError::ProcessFailed { .. }
            | ActionError::PathRejected { .. } => FailureKind::Execution,
        };
        Self::failure(correlation_id, kind, error)
    }

    pub fn from_protocol_error(correlation_id: impl Into<String>, error: &ProtocolError) -> Self {
        Self::failure(correlation_id, FailureKind::Protocol, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declined_mentions_skip() {
        let obs = Observation::declined("call_1", "write_file");
        assert_eq!(obs.outcome, Outcome::Declined);
        assert!(obs.content.contains("Skipped by operator"));
        assert!(obs.content.contains("write_file"));
    }

    #[test]
    fn action_errors_are_classified() {
        let obs = Observation::from_action_error("c", &ActionError::UnknownAction("nope".into()));
        assert_eq!(obs.outcome, Outcome::Failed(FailureKind::UnknownAction));
        assert!(obs.content.starts_with("Error: Unknown action: nope"));

        let obs = Observation::from_action_error(
            "c",
            &ActionError::InvalidArguments {
                action: "read_file".into(),
                reason: "missing required field 'file_path'".into(),
            },
        );
        assert_eq!(obs.outcome, Outcome::Failed(FailureKind::InvalidArguments));

        let obs = Observation::from_action_error(
            "c",
            &ActionError::ExecutionFailed {
                action: "read_file".into(),
                reason: "No such file".into(),
            },
        );
        assert_eq!(obs.outcome, Outcome::Failed(FailureKind::Execution));
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::Failed(FailureKind::UnknownAction)).unwrap();
        assert_eq!(json, r#"{"failed":"unknown_action"}"#);
        assert_eq!(serde_json::to_string(&Outcome::Declined).unwrap(), r#""declined""#);
    }
}
