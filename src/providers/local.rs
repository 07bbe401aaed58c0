//! Local inference server provider (Ollama `/api/generate`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Backend, BackendConfig, BackendResult, ProviderType};
use crate::error::BackendError;

/// Ollama generate endpoint on loopback
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Model requested from the local server
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Local LLM provider
pub struct LocalProvider {
    /// HTTP client
    client: Client,
    /// Full generate URL
    endpoint: String,
    /// Model to use
    model: String,
}

impl LocalProvider {
    /// Create a new local provider
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone())
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        let body = response.text().await.map_err(connection_error)?;
        tracing::debug!(%status, bytes = body.len(), "local backend responded");

        classify_response(&body)
    }
}

fn connection_error(err: reqwest::Error) -> BackendError {
    BackendError::connection(format!(
        "Error connecting to Ollama: {err}. Is 'ollama serve' running?"
    ))
}

/// Turn a raw `/api/generate` body into text or a classified error
fn classify_response(body: &str) -> Result<String, BackendError> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|err| {
        tracing::debug!(error = %err, "local backend body is not valid JSON");
        BackendError::protocol("No response from Ollama.")
    })?;

    if let Some(error) = parsed.error {
        return Err(BackendError::api(error));
    }

    parsed
        .response
        .ok_or_else(|| BackendError::protocol("No response from Ollama."))
}

#[async_trait]
impl Backend for LocalProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Local
    }

    fn name(&self) -> &'static str {
        "Local Ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn submit(&self, prompt: &str) -> BackendResult {
        tracing::info!(endpoint = %self.endpoint, model = %self.model, "querying local backend");
        self.request(prompt).await.into()
    }
}

// API types

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
