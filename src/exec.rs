//! Typed subprocess execution.
//!
//! External tools are always invoked with explicit argument vectors, never
//! through a shell, and always under a caller-supplied timeout. The trait
//! seam lets the audio stages run against a fake executor in tests.

use crate::error::{InnsiktError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a successfully exited subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Capability for running external commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, failing on non-zero exit, missing tool,
    /// or when the timeout elapses.
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput>;
}

/// Executor backed by `tokio::process`.
pub struct TokioExecutor;

#[async_trait]
impl CommandExecutor for TokioExecutor {
    async fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        debug!("Running {} ({} args, {}s timeout)", program, args.len(), timeout.as_secs());

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => {
                return Err(InnsiktError::ToolFailed(format!(
                    "{} timed out after {}s",
                    program,
                    timeout.as_secs()
                )));
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InnsiktError::ToolNotFound(program.to_string()));
            }
            Ok(Err(e)) => {
                return Err(InnsiktError::ToolFailed(format!(
                    "{program} execution failed: {e}"
                )));
            }
            Ok(Ok(o)) => o,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InnsiktError::ToolFailed(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
