//! Language-model backends.
//!
//! Both backends expose the same single operation, [`Backend::submit`], and
//! never fail across that boundary: every fault is classified into a
//! [`BackendResult::Failure`]. The variant is picked once, from the startup
//! configuration, by [`create_backend`].

pub mod gemini;
pub mod local;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BackendError, ErrorKind};

pub use gemini::GeminiProvider;
pub use local::LocalProvider;

/// Available backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Local Ollama-compatible inference server
    #[default]
    Local,
    /// Google Gemini API
    Cloud,
}

impl ProviderType {
    /// Endpoint used when none is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderType::Local => local::DEFAULT_ENDPOINT,
            ProviderType::Cloud => gemini::DEFAULT_ENDPOINT,
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Local => local::DEFAULT_MODEL,
            ProviderType::Cloud => gemini::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Local => write!(f, "local"),
            ProviderType::Cloud => write!(f, "cloud"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "ollama" => Ok(ProviderType::Local),
            "cloud" | "api" | "gemini" => Ok(ProviderType::Cloud),
            _ => Err(format!(
                "Unknown backend: {}. Valid options: local, cloud",
                s
            )),
        }
    }
}

/// Immutable backend settings, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub mode: ProviderType,
    /// Full URL for the local backend, API base URL for the cloud backend
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl BackendConfig {
    /// Config with the built-in endpoint and model for `mode`
    pub fn for_mode(mode: ProviderType) -> Self {
        Self {
            mode,
            endpoint: mode.default_endpoint().to_string(),
            model: mode.default_model().to_string(),
            api_key: None,
        }
    }
}

/// Outcome of exactly one backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendResult {
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

impl BackendResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        BackendResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BackendResult::Success(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            BackendResult::Success(_) => None,
            BackendResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Explanation on success, failure message otherwise
    pub fn text(&self) -> &str {
        match self {
            BackendResult::Success(text) => text,
            BackendResult::Failure { message, .. } => message,
        }
    }
}

impl From<Result<String, BackendError>> for BackendResult {
    fn from(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) => BackendResult::Success(text),
            Err(err) => BackendResult::Failure {
                kind: err.kind,
                message: err.message,
            },
        }
    }
}

/// A language-model backend that can explain a failed command
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> ProviderType;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Get the model identifier
    fn model_name(&self) -> &str;

    /// Send the prompt and classify the answer. One attempt, no retries.
    async fn submit(&self, prompt: &str) -> BackendResult;
}

/// Build the backend selected by `config`
pub fn create_backend(config: &BackendConfig) -> Box<dyn Backend> {
    tracing::debug!(
        backend = %config.mode,
        endpoint = %config.endpoint,
        model = %config.model,
        "creating backend"
    );
    match config.mode {
        ProviderType::Local => Box::new(LocalProvider::from_config(config)),
        ProviderType::Cloud => Box::new(GeminiProvider::from_config(config)),
    }
}
