//! Configuration system for `brainless`.
//!
//! Values are layered: CLI flag > environment variable > config file >
//! built-in default. The result is frozen into a [`BackendConfig`] once at
//! startup; nothing mutates it afterwards.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::providers::gemini::API_KEY_ENV;
use crate::providers::{BackendConfig, ProviderType};
use crate::runner::DEFAULT_TIMEOUT;

/// Backend selection and credentials
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BackendSection {
    /// "local" or "cloud"
    pub mode: ProviderType,
    /// Endpoint override (full URL for local, API base for cloud)
    pub endpoint: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Cloud API key (the environment variable wins)
    pub api_key: Option<String>,
}

/// Command re-execution settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerSection {
    /// Seconds before the re-executed command is killed
    pub timeout_secs: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSection,
    pub runner: RunnerSection,
}

/// Overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<ProviderType>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from file, returning default config if file doesn't exist
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read config, using defaults");
                return Self::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path (~/.config/brainless/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("brainless").join("config.toml"))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| env::var(name).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(mode) = get("BRAINLESS_BACKEND") {
            match mode.parse() {
                Ok(mode) => self.backend.mode = mode,
                Err(err) => tracing::warn!(%err, "ignoring BRAINLESS_BACKEND"),
            }
        }
        if let Some(model) = get("BRAINLESS_MODEL") {
            self.backend.model = Some(model);
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.backend.api_key = Some(key);
        }
    }

    /// Apply command-line overrides
    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(mode) = overrides.backend {
            self.backend.mode = mode;
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.backend.endpoint = Some(endpoint.clone());
        }
        if let Some(model) = &overrides.model {
            self.backend.model = Some(model.clone());
        }
        if let Some(secs) = overrides.timeout_secs {
            self.runner.timeout_secs = secs;
        }
    }

    /// Freeze the backend settings, filling in per-mode defaults
    pub fn resolve_backend(&self) -> BackendConfig {
        let mode = self.backend.mode;
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        BackendConfig {
            mode,
            endpoint: non_empty(&self.backend.endpoint)
                .unwrap_or_else(|| mode.default_endpoint().to_string()),
            model: non_empty(&self.backend.model)
                .unwrap_or_else(|| mode.default_model().to_string()),
            api_key: non_empty(&self.backend.api_key),
        }
    }

    /// Timeout for re-running the command (at least one second)
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_secs.max(1))
    }
}

/// Generate default config as TOML string
pub fn generate_default_config() -> String {
    r#"# Brainless - failed command diagnosis configuration
# Place this file at ~/.config/brainless/config.toml

[backend]
# "local" for an Ollama server, "cloud" for the Gemini API
mode = "local"

# Endpoint override. Local: full generate URL. Cloud: API base URL.
# endpoint = "http://localhost:11434/api/generate"

# Model override (local default: llama3.1, cloud default: gemini-2.0-flash)
# model = "llama3.1"

# Gemini API key (GEMINI_API_KEY takes precedence)
# api_key = ""

[runner]
# Seconds to wait for the re-executed command before giving up
timeout_secs = 10

# Environment variable overrides:
# BRAINLESS_BACKEND=cloud  - Select the backend
# BRAINLESS_MODEL=...      - Select the model
# GEMINI_API_KEY=...       - Cloud API key
# BRAINLESS_LOG=debug      - Log filter
"#
    .to_string()
}

/// Print the default config to stdout
pub fn print_default_config() {
    print!("{}", generate_default_config());
}
