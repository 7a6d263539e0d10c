use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;

/// `make_dir`: create a directory and any missing parents.
pub struct MakeDirAction {
    descriptor: ActionDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MakeDirArgs {
    path: String,
}

impl MakeDirAction {
    pub fn new() -> Self {
        Self {
            descriptor: ActionDescriptor::new("make_dir", "Create a directory", SideEffect::Mutating)
                .required("path", ParamType::String, "The directory to create"),
        }
    }
}

impl Default for MakeDirAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Action for MakeDirAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: MakeDirArgs = parse_args(self.name(), arguments)?;
        let path = ctx.resolve(&args.path).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: format!("Failed to create {}: {e}", path.display()),
            })?;

        Ok(ActionOutput::Text(format!("Created directory {}", path.display())))
    }
}
