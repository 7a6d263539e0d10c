use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::operator::Operator;
use opsloop_core::path::PathContext;
use serde::Deserialize;
use std::sync::Arc;

/// `ask_operator`: put a free-text question to the operator; the answer
/// becomes the observation.
pub struct AskOperatorAction {
    descriptor: ActionDescriptor,
    operator: Arc<dyn Operator>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AskOperatorArgs {
    question: String,
}

impl AskOperatorAction {
    pub fn new(operator: Arc<dyn Operator>) -> Self {
        Self {
            descriptor: ActionDescriptor::new(
                "ask_operator",
                "Ask the operator a question when information is missing",
                SideEffect::ReadOnly,
            )
            .required("question", ParamType::String, "The question to ask"),
            operator,
        }
    }
}

#[async_trait]
impl Action for AskOperatorAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        _ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: AskOperatorArgs = parse_args(self.name(), arguments)?;
        let answer = self
            .operator
            .ask(&args.question)
            .await
            .map_err(|e| ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: e.to_string(),
            })?;

        if answer.trim().is_empty() {
            return Ok(ActionOutput::Text("(the operator gave no answer)".into()));
        }
        Ok(ActionOutput::Text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsloop_core::error::OperatorError;
    use opsloop_core::operator::{ApprovalRequest, AutoApprove};

    struct FixedAnswer(&'static str);

    #[async_trait]
    impl Operator for FixedAnswer {
        async fn approve(&self, _request: &ApprovalRequest) -> Result<bool, OperatorError> {
            Ok(false)
        }

        async fn ask(&self, _question: &str) -> Result<String, OperatorError> {
            Ok(self.0.into())
        }
    }

    fn args() -> Arguments {
        serde_json::json!({"question": "Which region?"}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn answer_becomes_output() {
        let action = AskOperatorAction::new(Arc::new(FixedAnswer("eu-west-1")));
        let mut ctx = PathContext::new("/work");
        let out = action.execute(args(), &mut ctx).await.unwrap();
        assert_eq!(out.render(), "eu-west-1");
    }

    #[tokio::test]
    async fn blank_answer_is_reported() {
        let action = AskOperatorAction::new(Arc::new(FixedAnswer("  ")));
        let mut ctx = PathContext::new("/work");
        let out = action.execute(args(), &mut ctx).await.unwrap();
        assert!(out.render().contains("no answer"));
    }

    #[tokio::test]
    async fn unattended_operator_is_execution_error() {
        let action = AskOperatorAction::new(Arc::new(AutoApprove));
        let mut ctx = PathContext::new("/work");
        let err = action.execute(args(), &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("unattended"));
    }
}
