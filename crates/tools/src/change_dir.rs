use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;

/// `change_dir`: move the run's working directory. Only the path context
/// changes; the process cwd is left alone.
pub struct ChangeDirAction {
    descriptor: ActionDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChangeDirArgs {
    path: String,
}

impl ChangeDirAction {
    pub fn new() -> Self {
        Self {
            descriptor: ActionDescriptor::new(
                "change_dir",
                "Change the working directory for subsequent actions",
                SideEffect::Mutating,
            )
            .required("path", ParamType::String, "The directory to change into"),
        }
    }
}

impl Default for ChangeDirAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Action for ChangeDirAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: ChangeDirArgs = parse_args(self.name(), arguments)?;
        let cwd = ctx.change_dir(&args.path).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;
        Ok(ActionOutput::Text(format!("Working directory is now {}", cwd.display())))
    }
}
