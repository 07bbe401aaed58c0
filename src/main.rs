use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use brainless::cli::Cli;
use brainless::config::{print_default_config, Config};
use brainless::context::SystemContext;
use brainless::output::{
    format_error, format_models, print_analyzing, print_debug_section, print_nothing_to_diagnose,
    route, DiagnosisReport,
};
use brainless::pipeline::{command_from_args, ExitStatus, Outcome, Pipeline};
use brainless::providers::gemini::GeminiProvider;
use brainless::providers::{create_backend, BackendConfig, BackendResult, ProviderType};
use brainless::runner::CapturedOutput;
use brainless::spinner::ProgressIndicator;

const LOG_ENV: &str = "BRAINLESS_LOG";

fn init_logging(debug: bool) {
    let default = if debug { "brainless=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A second init only happens in tests; ignore it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "brainless", &mut io::stdout());
}

async fn list_models(config: &Config) -> ExitStatus {
    let mut backend = config.resolve_backend();
    if backend.mode != ProviderType::Cloud {
        // Only the cloud backend has a model catalogue
        let cloud = BackendConfig::for_mode(ProviderType::Cloud);
        backend = BackendConfig {
            api_key: backend.api_key,
            ..cloud
        };
    }

    match GeminiProvider::from_config(&backend).list_models().await {
        Ok(models) => {
            print!("{}", format_models(&models));
            ExitStatus::Success
        }
        Err(err) => {
            eprintln!(
                "{}",
                format_error(
                    &err.message,
                    Some("Set GEMINI_API_KEY or [backend] api_key in the config file")
                )
            );
            ExitStatus::Failure
        }
    }
}

fn print_debug_captured(captured: &CapturedOutput) {
    print_debug_section(
        "Captured Output",
        &captured.text,
        Some(format!(
            "({} chars, {} lines, {:?})",
            captured.text.chars().count(),
            captured.text.lines().count(),
            captured.status
        )),
    );
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Handle completions
    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.print_config {
        print_default_config();
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load();
    config.apply_env_overrides();
    config.apply_cli_overrides(&cli.overrides());

    if cli.list_models {
        return Ok(list_models(&config).await.into());
    }

    let command = match command_from_args(&cli.command) {
        Ok(command) => command,
        Err(status) => {
            eprintln!(
                "{}",
                format_error(
                    "No command given.",
                    Some("Usage: brainless <command> (e.g. brainless ls /nonexistent)")
                )
            );
            return Ok(status.into());
        }
    };

    let backend_config = config.resolve_backend();
    let backend = create_backend(&backend_config);
    let interactive = !cli.json && !cli.quiet;

    if interactive {
        print_analyzing(&command);
    }

    if cli.debug {
        eprintln!("{}", "=== DEBUG: Backend ===".yellow().bold());
        eprintln!("{} {}", "Name:".blue().bold(), backend.name());
        eprintln!("{} {}", "Model:".blue().bold(), backend.model_name());
        eprintln!("{} {}", "Endpoint:".blue().bold(), backend_config.endpoint);
        eprintln!();
    }

    let context = SystemContext::probe();
    tracing::debug!(%context, "probed system context");

    let show_indicator = interactive && io::stdout().is_terminal();
    let pipeline = Pipeline::new(backend.as_ref(), config.timeout());
    let outcome = pipeline
        .run(&command, context.clone(), || {
            if show_indicator {
                ProgressIndicator::stdout()
            } else {
                ProgressIndicator::disabled()
            }
        })
        .await;

    let status = outcome.exit_status();
    match outcome {
        Outcome::NothingToDiagnose { captured } => {
            if cli.debug {
                print_debug_captured(&captured);
            }
            if cli.json {
                let report =
                    DiagnosisReport::nothing_to_diagnose(&command, context.to_string(), &captured);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_nothing_to_diagnose();
            }
        }
        Outcome::Diagnosed {
            request,
            captured,
            prompt,
            result,
        } => {
            if cli.debug {
                print_debug_captured(&captured);
                print_debug_section(
                    "Prompt",
                    &prompt,
                    Some(format!("({} chars)", prompt.chars().count())),
                );
                let footer = match &result {
                    BackendResult::Success(text) => format!("({} chars)", text.chars().count()),
                    BackendResult::Failure { kind, .. } => format!("({kind})"),
                };
                print_debug_section("Response", result.text(), Some(footer));
            }

            if cli.json {
                let report = DiagnosisReport::new(
                    &request.raw_command,
                    request.system_context.to_string(),
                    &captured,
                    &result,
                );
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", route(&result, &mut rand::thread_rng()));
            }
        }
    }

    Ok(status.into())
}
