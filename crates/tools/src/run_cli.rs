//! `run_cli`: generic command-line passthrough (e.g. `aws s3 ls`).
//!
//! Programs are spawned directly with an argument vector, never through a
//! shell, and only if their base name is on the allowlist.

use async_trait::async_trait;
use opsloop_core::action::{Action, ActionDescriptor, ActionOutput, Arguments, ParamType, SideEffect, parse_args};
use opsloop_core::error::ActionError;
use opsloop_core::path::PathContext;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::process::CommandRunner;

pub struct RunCliAction {
    descriptor: ActionDescriptor,
    /// If empty, every program is allowed.
    allowed_programs: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunCliArgs {
    program: String,
    #[serde(default)]
    args: Vec<String>,
}

impl RunCliAction {
    pub fn new(allowed_programs: Vec<String>, runner: Arc<dyn CommandRunner>) -> Self {
        let description = format!(
            "Run a command-line program with arguments. Allowed programs: {}",
            if allowed_programs.is_empty() {
                "any".to_string()
            } else {
                allowed_programs.join(", ")
            }
        );
        Self {
            descriptor: ActionDescriptor::new("run_cli", &description, SideEffect::Destructive)
                .required("program", ParamType::String, "The program to run, e.g. aws")
                .optional(
                    "args",
                    ParamType::StringList,
                    "Arguments passed to the program, one per element",
                ),
            allowed_programs,
            runner,
        }
    }

    fn is_program_allowed(&self, program: &str) -> bool {
        if self.allowed_programs.is_empty() {
            return true;
        }
        let base = Path::new(program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(program);
        self.allowed_programs.iter().any(|a| a == base)
    }
}

#[async_trait]
impl Action for RunCliAction {
    fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError> {
        let args: RunCliArgs = parse_args(self.name(), arguments)?;

        if !self.is_program_allowed(&args.program) {
            warn!(program = %args.program, "Program not in allowlist");
            return Err(ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: format!("Program '{}' is not in the allowlist", args.program),
            });
        }

        debug!(program = %args.program, args = ?args.args, "Running CLI program");

        let output = self
            .runner
            .run(&args.program, &args.args, ctx.cwd())
            .await
            .map_err(|e| ActionError::ExecutionFailed {
                action: self.name().into(),
                reason: format!("Failed to start {}: {e}", args.program),
            })?;
        output.into_action_result(self.name())
    }
}
