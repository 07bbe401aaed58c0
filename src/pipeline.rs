//! The diagnose pipeline: re-run, capture, prompt, ask, classify.

use std::process::ExitCode;
use std::time::Duration;

use crate::context::SystemContext;
use crate::prompt::build_prompt;
use crate::providers::{Backend, BackendResult};
use crate::runner::{self, CapturedOutput};
use crate::spinner::ProgressIndicator;

/// Everything the backend is asked about. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRequest {
    pub raw_command: String,
    pub captured_output: String,
    pub system_context: SystemContext,
}

/// How a pipeline run ended
#[derive(Debug)]
pub enum Outcome {
    /// The command printed nothing; the backend was not consulted
    NothingToDiagnose { captured: CapturedOutput },
    /// The backend was asked exactly once
    Diagnosed {
        request: DiagnosticRequest,
        captured: CapturedOutput,
        prompt: String,
        result: BackendResult,
    },
}

impl Outcome {
    /// A diagnosis ends the run successfully even when the backend failed;
    /// the failure was already reported in-band.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Outcome::NothingToDiagnose { .. } | Outcome::Diagnosed { .. } => ExitStatus::Success,
        }
    }
}

/// Process exit status of a `brainless` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// No command given, or a side command failed
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Command text to diagnose, or the failure status when none was given
pub fn command_from_args(args: &[String]) -> Result<String, ExitStatus> {
    runner::join_command(args).ok_or(ExitStatus::Failure)
}

pub struct Pipeline<'a> {
    backend: &'a dyn Backend,
    timeout: Duration,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn Backend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Diagnose `command`.
    ///
    /// `start_indicator` is only called when there is something to send.
    /// The indicator is stopped (and its line erased) before this returns.
    pub async fn run<F>(&self, command: &str, context: SystemContext, start_indicator: F) -> Outcome
    where
        F: FnOnce() -> ProgressIndicator,
    {
        let captured = runner::run(command, self.timeout).await;
        if captured.is_empty() {
            tracing::info!("command produced no output");
            return Outcome::NothingToDiagnose { captured };
        }

        let request = DiagnosticRequest {
            raw_command: command.to_string(),
            captured_output: captured.text.clone(),
            system_context: context,
        };
        let prompt = build_prompt(
            &request.raw_command,
            &request.captured_output,
            &request.system_context,
        );

        let indicator = start_indicator();
        let result = self.backend.submit(&prompt).await;
        indicator.stop().await;

        match &result {
            BackendResult::Success(text) => {
                tracing::info!(chars = text.len(), backend = self.backend.name(), "diagnosis received")
            }
            BackendResult::Failure { kind, message } => {
                tracing::warn!(%kind, %message, backend = self.backend.name(), "backend failed")
            }
        }

        Outcome::Diagnosed {
            request,
            captured,
            prompt,
            result,
        }
    }
}
