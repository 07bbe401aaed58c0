//! Brainless - failed command diagnosis using an LLM
//!
//! This library provides the core functionality for the `brainless` CLI tool:
//! re-running a command, building the diagnostic prompt, querying a local or
//! cloud backend, and presenting the answer.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod runner;
pub mod spinner;

// Re-export commonly used types
pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use context::SystemContext;
pub use error::{BackendError, ErrorKind};
pub use output::{route, DiagnosisReport, RenderedOutput};
pub use pipeline::{command_from_args, DiagnosticRequest, ExitStatus, Outcome, Pipeline};
pub use providers::{create_backend, Backend, BackendConfig, BackendResult, ProviderType};
pub use runner::{CaptureStatus, CapturedOutput};
pub use spinner::ProgressIndicator;
