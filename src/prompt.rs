//! Prompt assembly.

use crate::context::SystemContext;

const PROMPT_TEMPLATE: &str = include_str!("prompt.txt");

/// Characters of captured output kept in the prompt
pub const MAX_OUTPUT_CHARS: usize = 2000;

/// Keep only the final `max_chars` characters of `text`.
///
/// The actionable part of an error is usually at the end, so the head is
/// dropped. Cuts on a char boundary.
pub fn tail_truncate(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// Substitute `{name}` placeholders in one pass.
///
/// Values are never rescanned, so a command containing `{output}` stays
/// literal. Unknown placeholders are left as-is.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                rendered.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Build the model prompt for a failed command
pub fn build_prompt(command: &str, output: &str, context: &SystemContext) -> String {
    let context = context.to_string();
    let output = tail_truncate(output, MAX_OUTPUT_CHARS);

    render_template(
        PROMPT_TEMPLATE,
        &[
            ("context", context.as_str()),
            ("command", command),
            ("output", output),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SystemContext {
        SystemContext::new("Ubuntu 24.04 LTS", "bash")
    }

    #[test]
    fn test_tail_truncate_short_passthrough() {
        assert_eq!(tail_truncate("short", 2000), "short");
        assert_eq!(tail_truncate("", 2000), "");
    }

    #[test]
    fn test_tail_truncate_exact_length() {
        let text = "a".repeat(2000);
        assert_eq!(tail_truncate(&text, 2000), text);
    }

    #[test]
    fn test_tail_truncate_keeps_the_end() {
        let text = format!("{}{}", "head-".repeat(1000), "y".repeat(2000));
        let truncated = tail_truncate(&text, 2000);
        assert_eq!(truncated.chars().count(), 2000);
        assert_eq!(truncated, "y".repeat(2000));
    }

    #[test]
    fn test_tail_truncate_multibyte() {
        let text = "é".repeat(2500);
        let truncated = tail_truncate(&text, 2000);
        assert_eq!(truncated.chars().count(), 2000);
        assert_eq!(truncated.len(), 4000);
    }

    #[test]
    fn test_tail_truncate_zero() {
        assert_eq!(tail_truncate("anything", 0), "");
    }

    #[test]
    fn test_build_prompt_embeds_everything() {
        let prompt = build_prompt(
            "ls /nonexistent",
            "ls: cannot access '/nonexistent': No such file or directory",
            &ctx(),
        );

        assert!(prompt.contains("Ubuntu 24.04 LTS | Shell: bash"));
        assert!(prompt.contains("COMMAND: ls /nonexistent"));
        assert!(prompt.contains("No such file or directory"));
        assert!(prompt.contains("SHELL COMMAND"));
        assert!(prompt.contains("Do not use introductory text"));
        assert!(!prompt.contains("{output}"));
        assert!(!prompt.contains("{command}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_build_prompt_truncates_long_output() {
        let output = format!("EARLY-MARKER\n{}", "z".repeat(3000));
        let prompt = build_prompt("make", &output, &ctx());

        assert!(!prompt.contains("EARLY-MARKER"));
        assert!(prompt.contains(&"z".repeat(2000)));
        assert!(!prompt.contains(&"z".repeat(2001)));
    }

    #[test]
    fn test_build_prompt_short_output_unchanged() {
        let output = "line1\nline2\n\nline4";
        let prompt = build_prompt("cmd", output, &ctx());
        assert!(prompt.contains(output));
    }

    #[test]
    fn test_build_prompt_deterministic() {
        let first = build_prompt("cargo build", "error[E0382]", &ctx());
        let second = build_prompt("cargo build", "error[E0382]", &ctx());
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_prompt_does_not_reexpand_values() {
        let prompt = build_prompt("echo {output}", "bad {context} here", &ctx());
        assert!(prompt.contains("COMMAND: echo {output}"));
        assert!(prompt.contains("bad {context} here"));
    }

    #[test]
    fn test_render_template_unknown_placeholder() {
        let rendered = render_template("a {x} {y} {", &[("x", "1")]);
        assert_eq!(rendered, "a 1 {y} {");
    }
}
