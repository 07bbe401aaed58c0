//! Presentation of diagnoses and terminal output helpers.
//!
//! Routing decides *how* a backend result is shown (which template), never
//! *what* is shown: the diagnostic text is printed exactly as received.

use colored::{Color, Colorize};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::error::ErrorKind;
use crate::providers::gemini::ModelInfo;
use crate::providers::BackendResult;
use crate::runner::CapturedOutput;

const RULE_WIDTH: usize = 40;

/// A cosmetic wrapper printed above the backend's text
#[derive(Debug, PartialEq, Eq)]
pub struct Template {
    pub key: &'static str,
    pub badge: &'static str,
    pub title: &'static str,
    pub lines: &'static [&'static str],
    pub color: Color,
}

/// Success variants, picked uniformly at random
pub static SUCCESS_TEMPLATES: [Template; 3] = [
    Template {
        key: "success_carried",
        badge: "✅",
        title: "CARRIED",
        lines: &[
            "I literally mogged that syntax error.",
            "Your code was acting sus, but I locked in.",
            "Here is the fix. You're welcome for the free elo.",
        ],
        color: Color::Green,
    },
    Template {
        key: "success_bare_minimum",
        badge: "✨",
        title: "BARE MINIMUM",
        lines: &[
            "Bro really tried to compile that? 💀",
            "I fixed it, but barely.",
            "Next time, try using at least 1% of your brain.",
        ],
        color: Color::Cyan,
    },
    Template {
        key: "success_brainrot",
        badge: "🧠",
        title: "BIG BRAIN ENERGY",
        lines: &[
            "Your logic was cooked.",
            "I had to fanum tax that whole function.",
            "It works now, no cap.",
        ],
        color: Color::Magenta,
    },
];

/// Shown whenever the backend could not help
pub static FAILURE_TEMPLATE: Template = Template {
    key: "failure",
    badge: "❌",
    title: "IT'S SO OVER",
    lines: &[
        "Nah. I can't even.",
        "This isn't a bug, this is a crime scene.",
        "I'm not fixing this.",
        "Delete the repo and start a farm.",
    ],
    color: Color::Red,
};

/// A routed backend result, ready to print
#[derive(Debug, PartialEq, Eq)]
pub struct RenderedOutput {
    pub template: &'static Template,
    /// Backend explanation or failure message, unmodified
    pub body: String,
    pub is_failure: bool,
}

/// Pick the presentation for a backend result
pub fn route<R: Rng + ?Sized>(result: &BackendResult, rng: &mut R) -> RenderedOutput {
    match result {
        BackendResult::Failure { kind, message } => {
            tracing::debug!(%kind, "routing failure");
            RenderedOutput {
                template: &FAILURE_TEMPLATE,
                body: message.clone(),
                is_failure: true,
            }
        }
        BackendResult::Success(text) => {
            let template = SUCCESS_TEMPLATES
                .choose(rng)
                .unwrap_or(&SUCCESS_TEMPLATES[0]);
            tracing::debug!(template = template.key, "routing success");
            RenderedOutput {
                template,
                body: text.clone(),
                is_failure: false,
            }
        }
    }
}

impl fmt::Display for RenderedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let template = self.template;
        let color = template.color;

        writeln!(f)?;
        writeln!(
            f,
            "{}",
            format!("{} STATUS: {}", template.badge, template.title).color(color)
        )?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH).color(color))?;
        for line in template.lines {
            writeln!(f, "{}", line.color(color))?;
        }
        writeln!(f)?;

        if self.is_failure {
            writeln!(f, "{}", self.body.red())?;
        } else {
            writeln!(f, "{}", self.body)?;
            write!(f, "{}", "-".repeat(RULE_WIDTH))?;
        }
        Ok(())
    }
}

/// Printed when the re-run command produced no output
pub const NOTHING_TO_DIAGNOSE: &str = "Command ran successfully. No bugs found (miraculously).";

/// Machine-readable result for `--json`, shared by every outcome
#[derive(Debug, Serialize)]
pub struct DiagnosisReport<'a> {
    pub command: &'a str,
    pub system_context: String,
    pub captured_output: &'a str,
    pub exit_code: Option<i32>,
    /// Timeout or spawn failure while re-running the command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_error_kind: Option<ErrorKind>,
    /// "success", "failure" or "nothing_to_diagnose"
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub text: &'a str,
}

impl<'a> DiagnosisReport<'a> {
    pub fn new(
        command: &'a str,
        system_context: String,
        captured: &'a CapturedOutput,
        result: &'a BackendResult,
    ) -> Self {
        Self {
            status: if result.is_success() {
                "success"
            } else {
                "failure"
            },
            error_kind: result.error_kind(),
            text: result.text(),
            ..Self::captured(command, system_context, captured)
        }
    }

    /// Report for a command that printed nothing; no backend was asked
    pub fn nothing_to_diagnose(
        command: &'a str,
        system_context: String,
        captured: &'a CapturedOutput,
    ) -> Self {
        Self::captured(command, system_context, captured)
    }

    fn captured(command: &'a str, system_context: String, captured: &'a CapturedOutput) -> Self {
        Self {
            command,
            system_context,
            captured_output: &captured.text,
            exit_code: captured.status.exit_code(),
            command_error_kind: captured.status.error_kind(),
            status: "nothing_to_diagnose",
            error_kind: None,
            text: NOTHING_TO_DIAGNOSE,
        }
    }
}

pub fn format_error(message: &str, tip: Option<&str>) -> String {
    let mut output = format!("{} {}", "Error:".red().bold(), message);
    if let Some(tip) = tip {
        output.push('\n');
        output.push_str(&format!("{} {}", "Tip:".blue().bold(), tip));
    }
    output
}

pub fn print_analyzing(command: &str) {
    println!();
    println!("{}", format!("🔍 Analyzing: '{command}'...").blue());
}

pub fn print_nothing_to_diagnose() {
    println!(
        "{}",
        format!("✅ {NOTHING_TO_DIAGNOSE}").green()
    );
}

pub fn print_debug_section(title: &str, body: &str, footer: Option<String>) {
    eprintln!("{}", format!("=== DEBUG: {title} ===").yellow().bold());
    if body.trim().is_empty() {
        eprintln!("{}", "| <empty>".dimmed());
    } else {
        for line in body.lines() {
            eprintln!("{}", format!("| {line}").bright_white());
        }
    }
    if let Some(footer) = footer {
        eprintln!("{}", footer.dimmed());
    }
    eprintln!();
}

/// Two-column listing of generation-capable models
pub fn format_models(models: &[ModelInfo]) -> String {
    let mut out = format!("{:<30} | DISPLAY NAME\n", "MODEL ID");
    out.push_str(&"-".repeat(50));
    out.push('\n');
    for model in models {
        out.push_str(&format!("{:<30} | {}\n", model.id, model.display_name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CaptureStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_route_failure_uses_failure_template() {
        let result = BackendResult::failure(ErrorKind::ConfigError, "GEMINI_API_KEY not set.");
        let rendered = route(&result, &mut StdRng::seed_from_u64(7));

        assert_eq!(rendered.template, &FAILURE_TEMPLATE);
        assert!(rendered.is_failure);
        assert_eq!(rendered.body, "GEMINI_API_KEY not set.");
    }

    #[test]
    fn test_route_success_uses_success_template() {
        let result = BackendResult::Success("Run: mkdir /nonexistent".to_string());
        let rendered = route(&result, &mut StdRng::seed_from_u64(1));

        assert!(!rendered.is_failure);
        assert!(SUCCESS_TEMPLATES.iter().any(|t| t == rendered.template));
        assert_eq!(rendered.body, "Run: mkdir /nonexistent");
    }

    #[test]
    fn test_route_success_covers_all_templates() {
        let result = BackendResult::Success("ok".to_string());
        let mut rng = StdRng::seed_from_u64(42);
        let keys: HashSet<_> = (0..200)
            .map(|_| route(&result, &mut rng).template.key)
            .collect();
        assert_eq!(keys.len(), 3);
        assert!(!keys.contains("failure"));
    }

    #[test]
    fn test_success_text_starting_with_error_is_still_success() {
        let result = BackendResult::Success("Error: the path is missing. Run mkdir.".to_string());
        let rendered = route(&result, &mut StdRng::seed_from_u64(3));
        assert!(!rendered.is_failure);
    }

    #[test]
    fn test_rendered_output_keeps_body_verbatim() {
        let body = "Directory doesn't exist.\n\n```sh\nmkdir -p /nonexistent\n```";
        let result = BackendResult::Success(body.to_string());
        let rendered = route(&result, &mut StdRng::seed_from_u64(9)).to_string();

        assert!(rendered.contains(body));
        assert!(rendered.contains("STATUS:"));
    }

    #[test]
    fn test_rendered_failure_contains_title_and_message() {
        let result = BackendResult::failure(ErrorKind::SafetyBlocked, "blocked");
        let rendered = route(&result, &mut StdRng::seed_from_u64(0)).to_string();
        assert!(rendered.contains("IT'S SO OVER"));
        assert!(rendered.contains("blocked"));
    }

    #[test]
    fn test_diagnosis_report_json() {
        let captured = CapturedOutput {
            text: "ls: cannot access".to_string(),
            status: CaptureStatus::Exited(Some(2)),
        };
        let result = BackendResult::failure(ErrorKind::ApiError, "quota");
        let report = DiagnosisReport::new("ls /x", "Arch | Shell: zsh".to_string(), &captured, &result);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["command"], "ls /x");
        assert_eq!(json["exit_code"], 2);
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error_kind"], "api_error");
        assert_eq!(json["text"], "quota");
    }

    #[test]
    fn test_diagnosis_report_success_omits_kind() {
        let captured = CapturedOutput {
            text: "boom".to_string(),
            status: CaptureStatus::TimedOut,
        };
        let result = BackendResult::Success("fix".to_string());
        let report = DiagnosisReport::new("x", String::new(), &captured, &result);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "success");
        assert!(json.get("error_kind").is_none());
        assert!(json["exit_code"].is_null());
    }

    #[test]
    fn test_diagnosis_report_carries_command_fault() {
        let captured = CapturedOutput {
            text: crate::runner::TIMEOUT_MESSAGE.to_string(),
            status: CaptureStatus::TimedOut,
        };
        let result = BackendResult::Success("it waits for input".to_string());
        let report = DiagnosisReport::new("read x", String::new(), &captured, &result);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["command_error_kind"], "command_timeout");
        assert_eq!(json["status"], "success");

        let captured = CapturedOutput {
            text: "No such file or directory".to_string(),
            status: CaptureStatus::ExecutionFailed,
        };
        let report = DiagnosisReport::new("x", String::new(), &captured, &result);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["command_error_kind"], "command_execution_failure");
    }

    #[test]
    fn test_diagnosis_report_exited_has_no_command_fault() {
        let captured = CapturedOutput {
            text: "boom".to_string(),
            status: CaptureStatus::Exited(Some(1)),
        };
        let result = BackendResult::Success("fix".to_string());
        let report = DiagnosisReport::new("x", String::new(), &captured, &result);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("command_error_kind").is_none());
    }

    #[test]
    fn test_nothing_to_diagnose_report_has_same_shape() {
        let empty = CapturedOutput {
            text: String::new(),
            status: CaptureStatus::Exited(Some(0)),
        };
        let nothing = serde_json::to_value(DiagnosisReport::nothing_to_diagnose(
            "true",
            "Arch | Shell: zsh".to_string(),
            &empty,
        ))
        .unwrap();

        assert_eq!(nothing["status"], "nothing_to_diagnose");
        assert_eq!(nothing["text"], NOTHING_TO_DIAGNOSE);
        assert_eq!(nothing["exit_code"], 0);
        assert!(nothing.get("error_kind").is_none());

        let captured = CapturedOutput {
            text: "err".to_string(),
            status: CaptureStatus::Exited(Some(2)),
        };
        let result = BackendResult::Success("fix".to_string());
        let report = DiagnosisReport::new("x", String::new(), &captured, &result);
        let diagnosed = serde_json::to_value(&report).unwrap();

        let keys = |value: &serde_json::Value| -> Vec<String> {
            value.as_object().unwrap().keys().cloned().collect()
        };
        assert_eq!(keys(&nothing), keys(&diagnosed));
    }

    #[test]
    fn test_format_models() {
        let models = vec![ModelInfo {
            id: "gemini-2.0-flash".to_string(),
            display_name: "Gemini 2.0 Flash".to_string(),
        }];
        let table = format_models(&models);
        assert!(table.starts_with("MODEL ID"));
        assert!(table.contains("gemini-2.0-flash               | Gemini 2.0 Flash"));
    }

    #[test]
    fn test_format_error_with_tip() {
        let message = format_error("No command given.", Some("brainless ls /nope"));
        assert!(message.contains("No command given."));
        assert!(message.contains("brainless ls /nope"));
    }
}
