//! Command execution capability.
//!
//! All process spawning goes through [`CommandExecutor`], so the search tiers
//! and handlers can be driven by a scripted executor in tests. Executors never
//! fail: non-zero exits, timeouts and spawn errors are all reported through
//! [`CommandOutcome`].

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Why a command could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The program does not exist.
    NotFound,
    /// The program exists but may not be executed.
    PermissionDenied,
    /// Any other I/O error.
    Other(String),
}

/// How a command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The process ran to completion. `None` means it was killed by a signal.
    Exited(Option<i32>),
    /// The process did not finish before the timeout and was killed.
    TimedOut,
    /// The process never started.
    SpawnFailed(SpawnFailure),
}

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub outcome: CommandOutcome,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            outcome: CommandOutcome::Exited(Some(code)),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self {
            outcome: CommandOutcome::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn spawn_failed(failure: SpawnFailure) -> Self {
        Self {
            outcome: CommandOutcome::SpawnFailed(failure),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Exit code 0.
    pub fn success(&self) -> bool {
        self.outcome == CommandOutcome::Exited(Some(0))
    }

    /// The process ran, whatever its exit code.
    pub fn ran(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Exited(_))
    }

    /// Exit code, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            CommandOutcome::Exited(code) => code,
            _ => None,
        }
    }
}

/// Runs a system command with a timeout.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, killing it after `timeout`.
    async fn execute(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput;
}

/// [`CommandExecutor`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandExecutor;

#[async_trait]
impl CommandExecutor for TokioCommandExecutor {
    async fn execute(&self, program: &str, args: &[&str], limit: Duration) -> CommandOutput {
        debug!(program, ?args, "running command");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(limit, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                let failure = match e.kind() {
                    std::io::ErrorKind::NotFound => SpawnFailure::NotFound,
                    std::io::ErrorKind::PermissionDenied => SpawnFailure::PermissionDenied,
                    _ => SpawnFailure::Other(e.to_string()),
                };
                return CommandOutput::spawn_failed(failure);
            }
            Err(_) => {
                debug!(program, ?limit, "command timed out");
                return CommandOutput::timed_out();
            }
        };

        CommandOutput {
            outcome: CommandOutcome::Exited(output.status.code()),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
