//! Re-execution of the failing command.
//!
//! The command text goes through the system shell so pipes, redirects and
//! globs behave exactly as they did interactively. Every fault is folded into
//! the captured text: whatever went wrong is "the error to diagnose".

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::ErrorKind;

/// Default hard limit for re-running a command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured text reported when the command outlives its timeout
pub const TIMEOUT_MESSAGE: &str = "Command timed out. It might be waiting for input.";

/// How the re-executed command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    /// Process exited (code is None when killed by a signal)
    Exited(Option<i32>),
    /// Killed after exceeding the timeout
    TimedOut,
    /// Could not spawn or wait on the process
    ExecutionFailed,
}

impl CaptureStatus {
    /// The fault this status represents, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            CaptureStatus::Exited(_) => None,
            CaptureStatus::TimedOut => Some(ErrorKind::CommandTimeout),
            CaptureStatus::ExecutionFailed => Some(ErrorKind::CommandExecutionFailure),
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CaptureStatus::Exited(code) => *code,
            _ => None,
        }
    }
}

/// Output of a re-executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// stderr followed by stdout, or a fault description
    pub text: String,
    pub status: CaptureStatus,
}

impl CapturedOutput {
    /// Nothing to diagnose
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Join CLI arguments into the command text exactly as typed
pub fn join_command(args: &[String]) -> Option<String> {
    let command = args.join(" ");
    if command.trim().is_empty() {
        None
    } else {
        Some(command)
    }
}

#[cfg(unix)]
fn shell_command(command_text: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_text);
    cmd
}

#[cfg(windows)]
fn shell_command(command_text: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_text);
    cmd
}

/// Re-run `command_text` through the shell and capture what it printed.
///
/// Never returns an error: timeouts and spawn failures are reported through
/// [`CapturedOutput::text`] and [`CapturedOutput::status`].
pub async fn run(command_text: &str, timeout: Duration) -> CapturedOutput {
    tracing::debug!(command = command_text, ?timeout, "re-running command");

    let child = shell_command(command_text)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Only the immediate child is killed on timeout
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(error = %err, "failed to spawn command");
            return CapturedOutput {
                text: err.to_string(),
                status: CaptureStatus::ExecutionFailed,
            };
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stdout));
            tracing::debug!(
                exit_code = ?output.status.code(),
                bytes = text.len(),
                "command finished"
            );
            CapturedOutput {
                text,
                status: CaptureStatus::Exited(output.status.code()),
            }
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "failed to wait on command");
            CapturedOutput {
                text: err.to_string(),
                status: CaptureStatus::ExecutionFailed,
            }
        }
        Err(_) => {
            tracing::warn!(?timeout, "command timed out");
            CapturedOutput {
                text: TIMEOUT_MESSAGE.to_string(),
                status: CaptureStatus::TimedOut,
            }
        }
    }
}
