//! `read_file`: read a file's contents, resolved against the path context.

use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;

pub struct ReadFileAction {
    descriptor: ActionDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadFileArgs {
    file_path: String,
}

impl ReadFileAction {
    pub fn new() -> Self {
        Self {
            descriptor: ActionDescriptor::new("read_file", "Read a file", SideEffect::ReadOnly)
                .required("file_path", ParamType::String, "The path to the file to read"),
        }
    }
}

impl Default for ReadFileAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Action for ReadFileAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: ReadFileArgs = parse_args(self.name(), arguments)?;
        let path = ctx.resolve(&args.file_path).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;

        tokio::fs::read_to_string(&path)
            .await
            .map(ActionOutput::Text)
            .map_err(|e| ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: format!("Failed to read {}: {e}", path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn descriptor() {
        let action = ReadFileAction::new();
        assert_eq!(action.name(), "read_file");
        assert_eq!(action.descriptor().side_effect, SideEffect::ReadOnly);
        let schema = action.descriptor().schema.to_json_schema();
        assert_eq!(schema["required"], serde_json::json!(["file_path"]));
    }

    #[tokio::test]
    async fn read_relative_to_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.py"), "import csv\n").unwrap();

        let mut ctx = PathContext::new(dir.path());
        let out = ReadFileAction::new()
            .execute(args(serde_json::json!({"file_path": "api.py"})), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out.render(), "import csv\n");
    }

    #[tokio::test]
    async fn read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PathContext::new(dir.path());
        let err = ReadFileAction::new()
            .execute(args(serde_json::json!({"file_path": "missing.txt"})), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ExecutionFailed { .. }));
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn forbidden_path_blocked() {
        let mut ctx = PathContext::new("/work").with_forbidden(vec!["/etc".into()]);
        let err = ReadFileAction::new()
            .execute(args(serde_json::json!({"file_path": "/etc/shadow"})), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::PathRejected { .. }));
    }
}
