//! Command-line interface definitions for `brainless`.

use clap::Parser;
use clap_complete::Shell;

use crate::config::CliOverrides;
use crate::providers::ProviderType;

/// Re-run a failing command and have an LLM explain the error
#[derive(Parser, Debug)]
#[command(
    name = "brainless",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BRAINLESS_GIT_SHA"), ")"),
    about,
    long_about = None
)]
#[command(
    after_help = "EXAMPLES:\n    brainless ls /nonexistent\n    brainless cargo build\n    brainless --backend cloud \"cat config.yml | yq .port\""
)]
pub struct Cli {
    /// Command to re-run and diagnose
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Backend to ask (overrides config and BRAINLESS_BACKEND)
    #[arg(long, short = 'b', value_enum, value_name = "BACKEND")]
    pub backend: Option<ProviderType>,

    /// Model identifier (overrides config and BRAINLESS_MODEL)
    #[arg(long, short = 'm', value_name = "MODEL")]
    pub model: Option<String>,

    /// Backend endpoint override
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Seconds to wait for the re-run command (default: 10)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output as JSON
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Show debug info (captured output, prompt, raw response)
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// No banner and no progress indicator
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// List cloud models that can generate content and exit
    #[arg(long)]
    pub list_models: bool,

    /// Output default configuration to stdout
    #[arg(long)]
    pub print_config: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            backend: self.backend,
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout,
        }
    }
}
