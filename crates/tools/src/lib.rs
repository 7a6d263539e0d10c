//! Built-in actions for opsloop.
//!
//! Actions give the agent its hands: list, read and write files, move the
//! working directory, drive terraform, pass through to allowlisted CLIs,
//! and ask the operator for missing information.

pub mod ask_operator;
pub mod change_dir;
pub mod list_files;
pub mod make_dir;
pub mod process;
pub mod read_file;
pub mod run_cli;
pub mod terraform;
pub mod write_file;

use opsloop_core::action::ActionRegistry;
use opsloop_core::error::ActionError;
use opsloop_core::operator::Operator;
use std::sync::Arc;

pub use process::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use terraform::TerraformCommand;

/// Knobs for the built-in action set.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Programs `run_cli` may spawn (matched on base name)
    pub allowed_programs: Vec<String>,
    /// Path or name of the terraform binary
    pub terraform_binary: String,
    /// File written by `write_terraform_config`, relative to the working directory
    pub terraform_file: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            allowed_programs: vec!["aws".into(), "terraform".into(), "git".into()],
            terraform_binary: "terraform".into(),
            terraform_file: "main.tf".into(),
        }
    }
}

/// Create the registry with every built-in action.
///
/// Only fails if two actions share a name.
pub fn default_registry(
    options: RegistryOptions,
    runner: Arc<dyn CommandRunner>,
    operator: Arc<dyn Operator>,
) -> Result<ActionRegistry, ActionError> {
    let mut builder = ActionRegistry::builder()
        .register(list_files::ListFilesAction::new())?
        .register(read_file::ReadFileAction::new())?
        .register(write_file::WriteFileAction::new())?
        .register(make_dir::MakeDirAction::new())?
        .register(change_dir::ChangeDirAction::new())?
        .register(terraform::WriteTerraformConfigAction::new(options.terraform_file))?;

    for command in TerraformCommand::ALL {
        builder.register_boxed(Box::new(terraform::TerraformAction::new(
            command,
            options.terraform_binary.clone(),
            runner.clone(),
        )))?;
    }

    Ok(builder
        .register(run_cli::RunCliAction::new(options.allowed_programs, runner))?
        .register(ask_operator::AskOperatorAction::new(operator))?
        .build())
}
