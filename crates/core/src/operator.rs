//! Operator trait: the human (or policy) that approves actions and
//! answers free-text questions.
//!
//! The confirmation gate decides *when* approval is needed and *what* is
//! shown; an `Operator` implementation decides *how* the decision is made.

use async_trait::async_trait;
use serde::Serialize;

use crate::action::{Arguments, SideEffect};
use crate::error::OperatorError;

/// What the operator is shown before a mutating or destructive action runs.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRequest {
    pub action: String,
    pub side_effect: SideEffect,
    /// The exact argument values, unabridged
    pub arguments: Arguments,
}

impl std::fmt::Display for ApprovalRequest {
    /// Strings are printed raw so multi-line file contents read naturally.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "About to run {} action '{}'", self.side_effect, self.action)?;
        for (name, value) in &self.arguments {
            match value {
                serde_json::Value::String(s) if s.contains('\n') => {
                    writeln!(f, "  {name}:")?;
                    for line in s.lines() {
                        writeln!(f, "    {line}")?;
                    }
                }
                serde_json::Value::String(s) => writeln!(f, "  {name}: {s}")?,
                other => writeln!(f, "  {name}: {other}")?,
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait Operator: Send + Sync {
    /// Present an approval request and block until a decision is made.
    async fn approve(&self, request: &ApprovalRequest) -> Result<bool, OperatorError>;

    /// Ask a free-text question and wait for the answer.
    async fn ask(&self, question: &str) -> Result<String, OperatorError>;
}

/// Unattended policy: approves everything, cannot answer questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Operator for AutoApprove {
    async fn approve(&self, request: &ApprovalRequest) -> Result<bool, OperatorError> {
        tracing::info!(action = %request.action, side_effect = %request.side_effect, "Auto-approved");
        Ok(true)
    }

    async fn ask(&self, _question: &str) -> Result<String, OperatorError> {
        Err(OperatorError::Unavailable(
            "running unattended, no operator to answer questions".into(),
        ))
    }
}
