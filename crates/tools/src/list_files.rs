//! `list_files`: sorted listing of a folder.

use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;

pub struct ListFilesAction {
    descriptor: ActionDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListFilesArgs {
    folder: String,
}

impl ListFilesAction {
    pub fn new() -> Self {
        Self {
            descriptor: ActionDescriptor::new(
                "list_files",
                "List all files in a folder. Directories end with '/'.",
                SideEffect::ReadOnly,
            )
            .required("folder", ParamType::String, "The folder to list files from"),
        }
    }
}

impl Default for ListFilesAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Action for ListFilesAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: ListFilesArgs = parse_args(self.name(), arguments)?;
        let folder = ctx.resolve(&args.folder).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;

        let failed = |e: std::io::Error| ActionError::ExecutionFailed {
            action: self.name().into(),
            reason: format!("Failed to list {}: {e}", folder.display()),
        };

        let mut entries = tokio::fs::read_dir(&folder).await.map_err(failed)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(failed)? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a link to a directory is listed as one
            if tokio::fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir()) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        if names.is_empty() {
            return Ok(ActionOutput::Text(format!("{} is empty", folder.display())));
        }
        Ok(ActionOutput::Lines(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn lists_sorted_with_dir_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "").unwrap();
        std::fs::write(dir.path().join("api.py"), "").unwrap();
        std::fs::create_dir(dir.path().join("modules")).unwrap();

        let mut ctx = PathContext::new(dir.path());
        let out = ListFilesAction::new()
            .execute(args(serde_json::json!({"folder": "."})), &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            out,
            ActionOutput::Lines(vec!["api.py".into(), "main.tf".into(), "modules/".into()])
        );
        assert_eq!(out.render(), "api.py\nmain.tf\nmodules/");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_gets_dir_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join("main.tf"), "").unwrap();
        std::os::unix::fs::symlink(dir.path().join("modules"), dir.path().join("shared")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("main.tf"), dir.path().join("link.tf")).unwrap();

        let mut ctx = PathContext::new(dir.path());
        let out = ListFilesAction::new()
            .execute(args(serde_json::json!({"folder": "."})), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out.render(), "link.tf\nmain.tf\nmodules/\nshared/");
    }

    #[tokio::test]
    async fn empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PathContext::new(dir.path());
        let out = ListFilesAction::new()
            .execute(args(serde_json::json!({"folder": "."})), &mut ctx)
            .await
            .unwrap();
        assert!(out.render().ends_with("is empty"));
    }

    #[tokio::test]
    async fn missing_folder_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PathContext::new(dir.path());
        let err = ListFilesAction::new()
            .execute(args(serde_json::json!({"folder": "nope"})), &mut ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to list"));
    }
}
