//! `write_file`: create or overwrite a file. Mutating, so the gate shows
//! the operator the full content before this runs.

use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;
use std::path::Path;

pub struct WriteFileAction {
    descriptor: ActionDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

impl WriteFileAction {
    pub fn new() -> Self {
        Self {
            descriptor: ActionDescriptor::new(
                "write_file",
                "Rewrite a file with new content. Creates the file and missing parent directories.",
                SideEffect::Mutating,
            )
            .required("file_path", ParamType::String, "The path to the file to rewrite")
            .required("content", ParamType::String, "The new content to write to the file"),
        }
    }
}

impl Default for WriteFileAction {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to `path`, creating parent directories first.
pub(crate) async fn write_with_parents(
    action: &str,
    path: &Path,
    content: &str,
) -> Result<ActionOutput, ActionError> {
    let failed = |reason: String| ActionError::ExecutionFailed {
        action: action.to_string(),
        reason,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| failed(format!("Failed to create directory {}: {e}", parent.display())))?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| failed(format!("Failed to write {}: {e}", path.display())))?;

    Ok(ActionOutput::Text(format!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    )))
}

#[async_trait]
impl Action for WriteFileAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: WriteFileArgs = parse_args(self.name(), arguments)?;
        let path = ctx.resolve(&args.file_path).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;
        write_with_parents(self.name(), &path, &args.content).await
    }
}
