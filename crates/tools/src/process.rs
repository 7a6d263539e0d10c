//! External process collaborator: run a program with an argument vector
//! in a given directory and capture what it printed.
//!
//! A non-zero exit is not an error at this layer; actions decide how to
//! report it.

use async_trait::async_trait;
use opsloop_core::action::ActionOutput;
use opsloop_core::error::ActionError;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// Exit status (-1 if killed by a signal)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Combined text: stdout, then stderr tagged.
    pub fn render(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        let text = match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => format!("[stderr]: {stderr}"),
            (false, false) => format!("{stdout}\n[stderr]: {stderr}"),
        };
        if text.is_empty() {
            "(no output)".into()
        } else {
            text
        }
    }

    /// Success becomes the observation text, a non-zero exit an execution error.
    pub fn into_action_result(self, action: &str) -> Result<ActionOutput, ActionError> {
        if self.success() {
            Ok(ActionOutput::Text(self.render()))
        } else {
            Err(ActionError::ProcessFailed {
                action: action.to_string(),
                status: self.status,
                output: self.render(),
            })
        }
    }
}

/// Runs external programs on behalf of actions.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], cwd: &Path)
    -> std::io::Result<CommandOutput>;
}

/// Runs programs directly (no shell) with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        debug!(program = %program, ?args, cwd = %cwd.display(), "Spawning process");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(std::process::Stdio::null())
            .output()
            .await?;

        let status = output.status.code().unwrap_or(-1);
        if status != 0 {
            warn!(program = %program, exit_code = status, "Process exited with failure");
        }

        Ok(CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// A recorded invocation.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Invocation {
        pub program: String,
        pub args: Vec<String>,
        pub cwd: PathBuf,
    }

    /// Records invocations and replies with a fixed output.
    pub struct FakeRunner {
        pub reply: CommandOutput,
        pub calls: Mutex<Vec<Invocation>>,
    }

    impl FakeRunner {
        pub fn ok(stdout: &str) -> Self {
            Self::with_status(0, stdout, "")
        }

        pub fn with_status(status: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                reply: CommandOutput {
                    status,
                    stdout: stdout.into(),
                    stderr: stderr.into(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            cwd: &Path,
        ) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(Invocation {
                program: program.into(),
                args: args.to_vec(),
                cwd: cwd.to_path_buf(),
            });
            Ok(self.reply.clone())
        }
    }
}
