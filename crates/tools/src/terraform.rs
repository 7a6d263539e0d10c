//! Terraform actions: writing the configuration file and running the
//! `init` / `plan` / `apply` / `destroy` subcommands in the context
//! directory.
//!
//! Nothing here interprets infrastructure; the binary does the work and
//! its output goes back to the model.

use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::process::CommandRunner;
use crate::write_file::write_with_parents;

/// The terraform subcommands exposed as actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformCommand {
    Init,
    Plan,
    Apply,
    Destroy,
}

impl TerraformCommand {
    pub const ALL: [TerraformCommand; 4] = [Self::Init, Self::Plan, Self::Apply, Self::Destroy];

    pub fn action_name(&self) -> &'static str {
        match self {
            Self::Init => "terraform_init",
            Self::Plan => "terraform_plan",
            Self::Apply => "terraform_apply",
            Self::Destroy => "terraform_destroy",
        }
    }

    /// Plan only reads state; apply and destroy change real infrastructure.
    pub fn side_effect(&self) -> SideEffect {
        match self {
            Self::Plan => SideEffect::ReadOnly,
            Self::Init => SideEffect::Mutating,
            Self::Apply | Self::Destroy => SideEffect::Destructive,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Init => "Initialize the Terraform working directory",
            Self::Plan => "Show the changes Terraform would make",
            Self::Apply => "Apply the Terraform configuration",
            Self::Destroy => "Destroy the infrastructure managed by the Terraform configuration",
        }
    }

    /// Non-interactive argv for the subcommand.
    pub fn args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Init => &["init", "-input=false"],
            Self::Plan => &["plan", "-input=false", "-no-color"],
            Self::Apply => &["apply", "-auto-approve", "-input=false", "-no-color"],
            Self::Destroy => &["destroy", "-auto-approve", "-input=false", "-no-color"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

/// Runs one terraform subcommand.
pub struct TerraformAction {
    descriptor: ActionDescriptor,
    command: TerraformCommand,
    binary: String,
    runner: Arc<dyn CommandRunner>,
}

impl TerraformAction {
    pub fn new(
        command: TerraformCommand,
        binary: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            descriptor: ActionDescriptor::new(
                command.action_name(),
                command.description(),
                command.side_effect(),
            ),
            command,
            binary: binary.into(),
            runner,
        }
    }
}

#[async_trait]
impl Action for TerraformAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        _arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args = self.command.args();
        info!(action = %self.name(), cwd = %ctx.cwd().display(), "Running terraform");

        let output = self
            .runner
            .run(&self.binary, &args, ctx.cwd())
            .await
            .map_err(|e| ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: format!("Failed to start {}: {e}", self.binary),
            })?;
        output.into_action_result(self.name())
    }
}

/// `write_terraform_config`: write the configuration file at its fixed
/// name inside the context directory.
pub struct WriteTerraformConfigAction {
    descriptor: ActionDescriptor,
    file_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteTerraformConfigArgs {
    content: String,
}

impl WriteTerraformConfigAction {
    pub fn new(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            descriptor: ActionDescriptor::new(
                "write_terraform_config",
                &format!("Write the Terraform configuration to {file_name} in the working directory"),
                SideEffect::Mutating,
            )
            .required("content", ParamType::String, "The full Terraform configuration"),
            file_name,
        }
    }
}

#[async_trait]
impl Action for WriteTerraformConfigAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: WriteTerraformConfigArgs = parse_args(self.name(), arguments)?;
        let path = ctx.resolve(&self.file_name).map_err(|source| ActionError::PathRejected {
            action: self.name().into(),
            source,
        })?;
        write_with_parents(self.name(), &path, &args.content).await
    }
}
