//! Host OS and shell, included in every prompt.
//!
//! Probing never aborts a diagnosis: every failure collapses into a
//! placeholder.

use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

/// Placeholder used when the OS cannot be determined
pub const UNKNOWN_OS: &str = "Unknown OS";

/// Placeholder used when `$SHELL` is unset
pub const UNKNOWN_SHELL: &str = "unknown";

/// OS and shell the failing command was run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemContext {
    /// Human readable OS name, e.g. "Ubuntu 24.04.1 LTS"
    pub os_description: String,

    /// Shell binary name, e.g. "zsh"
    pub shell_name: String,
}

impl SystemContext {
    pub fn new(os_description: impl Into<String>, shell_name: impl Into<String>) -> Self {
        Self {
            os_description: os_description.into(),
            shell_name: shell_name.into(),
        }
    }

    /// Probe the current host. Never fails.
    pub fn probe() -> Self {
        let shell_name = shell_name_from(env::var("SHELL").ok().as_deref());
        let os_description = os_description().unwrap_or_else(|| UNKNOWN_OS.to_string());
        tracing::debug!(os = %os_description, shell = %shell_name, "probed system context");

        Self {
            os_description,
            shell_name,
        }
    }
}

impl fmt::Display for SystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | Shell: {}", self.os_description, self.shell_name)
    }
}

/// Last path segment of the shell variable, "unknown" if absent
fn shell_name_from(shell: Option<&str>) -> String {
    shell
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Path::new(s).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNKNOWN_SHELL.to_string())
}

#[cfg(windows)]
fn os_description() -> Option<String> {
    let os = env::var("OS").unwrap_or_default();
    Some(format!("Windows {os}").trim_end().to_string())
}

#[cfg(not(windows))]
fn os_description() -> Option<String> {
    let release = ["/etc/os-release", "/usr/lib/os-release"]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok());

    match release {
        Some(contents) => pretty_name(&parse_os_release(&contents)),
        // macOS and the BSDs ship no os-release file
        None => Some(env::consts::OS.to_string()),
    }
}

/// Pick the display name out of parsed os-release variables
#[cfg_attr(windows, allow(dead_code))]
fn pretty_name(vars: &HashMap<String, String>) -> Option<String> {
    if let Some(pretty) = vars.get("PRETTY_NAME").filter(|v| !v.is_empty()) {
        return Some(pretty.clone());
    }

    let name = vars.get("NAME").filter(|v| !v.is_empty())?;
    match vars.get("VERSION").filter(|v| !v.is_empty()) {
        Some(version) => Some(format!("{name} {version}")),
        None => Some(name.clone()),
    }
}

/// Parse `KEY=value` lines, stripping optional quotes
#[cfg_attr(windows, allow(dead_code))]
fn parse_os_release(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_name_from_path() {
        assert_eq!(shell_name_from(Some("/bin/bash")), "bash");
        assert_eq!(shell_name_from(Some("/usr/local/bin/fish")), "fish");
        assert_eq!(shell_name_from(Some("zsh")), "zsh");
    }

    #[test]
    fn test_shell_name_missing() {
        assert_eq!(shell_name_from(None), "unknown");
        assert_eq!(shell_name_from(Some("")), "unknown");
        assert_eq!(shell_name_from(Some("   ")), "unknown");
    }

    #[test]
    fn test_parse_os_release_quotes_and_comments() {
        let vars = parse_os_release(
            "# comment\nNAME=\"Ubuntu\"\nVERSION='24.04 LTS'\nID=ubuntu\n\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n",
        );
        assert_eq!(vars.get("NAME").map(String::as_str), Some("Ubuntu"));
        assert_eq!(vars.get("VERSION").map(String::as_str), Some("24.04 LTS"));
        assert_eq!(vars.get("ID").map(String::as_str), Some("ubuntu"));
        assert_eq!(
            vars.get("PRETTY_NAME").map(String::as_str),
            Some("Ubuntu 24.04 LTS")
        );
    }

    #[test]
    fn test_pretty_name_preferred() {
        let vars = parse_os_release("NAME=Arch Linux\nPRETTY_NAME=\"Arch Linux\"\n");
        assert_eq!(pretty_name(&vars), Some("Arch Linux".to_string()));
    }

    #[test]
    fn test_pretty_name_falls_back_to_name_and_version() {
        let vars = parse_os_release("NAME=Fedora\nVERSION=\"40 (Workstation)\"\n");
        assert_eq!(
            pretty_name(&vars),
            Some("Fedora 40 (Workstation)".to_string())
        );

        let vars = parse_os_release("NAME=Alpine\n");
        assert_eq!(pretty_name(&vars), Some("Alpine".to_string()));
    }

    #[test]
    fn test_pretty_name_empty_release() {
        assert_eq!(pretty_name(&parse_os_release("")), None);
    }

    #[test]
    fn test_display_format() {
        let ctx = SystemContext::new("Debian GNU/Linux 12 (bookworm)", "bash");
        assert_eq!(
            ctx.to_string(),
            "Debian GNU/Linux 12 (bookworm) | Shell: bash"
        );
    }

    #[test]
    fn test_probe_never_empty() {
        let ctx = SystemContext::probe();
        assert!(!ctx.os_description.is_empty());
        assert!(!ctx.shell_name.is_empty());
    }
}
