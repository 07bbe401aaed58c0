//! Google Gemini API provider.
//!
//! Uses `models/<model>:generateContent`. Gemini reports quota and key
//! problems in an `error` object and safety refusals via `promptFeedback`,
//! often with a non-2xx status, so the body is classified regardless of
//! the HTTP status.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{Backend, BackendConfig, BackendResult, ProviderType};
use crate::error::{BackendError, ErrorKind};

/// Gemini REST API base
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini provider
pub struct GeminiProvider {
    /// HTTP client
    client: Client,
    /// API key, checked before any request is made
    api_key: Option<String>,
    /// API base URL
    endpoint: String,
    /// Model to use
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(
        api_key: Option<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.is_empty()),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.model.clone(),
        )
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| BackendError::config(format!("{API_KEY_ENV} not set.")))
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, BackendError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", api_key)])
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        let body = response.text().await.map_err(connection_error)?;
        tracing::debug!(%status, bytes = body.len(), "gemini responded");

        let body: Value = serde_json::from_str(&body).map_err(|err| {
            tracing::debug!(error = %err, "gemini body is not valid JSON");
            BackendError::protocol("Unexpected response format.")
        })?;
        classify_response(&body)
    }

    /// List models that support `generateContent`
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(format!("{}/models", self.endpoint))
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(connection_error)?;
        let body: Value = response.json().await.map_err(|err| {
            if err.is_decode() {
                BackendError::protocol("Unexpected response format.")
            } else {
                connection_error(err)
            }
        })?;

        parse_models(&body)
    }
}

/// The request URL carries the API key, so it is stripped from the message
fn connection_error(err: reqwest::Error) -> BackendError {
    BackendError::connection(format!("Connection Error: {}", err.without_url()))
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

/// Classify a decoded `generateContent` body. First match wins:
/// explicit error, safety block, candidates, anything else.
pub fn classify_response(body: &Value) -> Result<String, BackendError> {
    if let Some(error) = body.get("error") {
        return Err(BackendError::api(error_message(error)));
    }

    let candidates = body
        .get("candidates")
        .and_then(Value::as_array)
        .filter(|candidates| !candidates.is_empty());

    let Some(candidates) = candidates else {
        if let Some(feedback) = body.get("promptFeedback") {
            let mut message = "The prompt was blocked by safety filters.".to_string();
            if let Some(reason) = feedback.get("blockReason").and_then(Value::as_str) {
                message.push_str(&format!(" (reason: {reason})"));
            }
            return Err(BackendError::new(ErrorKind::SafetyBlocked, message));
        }
        return Err(BackendError::protocol("Unexpected response format."));
    };

    candidates[0]
        .pointer("/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendError::protocol("Unexpected response format."))
}

/// A model usable for content generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model id without the `models/` prefix
    pub id: String,
    pub display_name: String,
}

fn parse_models(body: &Value) -> Result<Vec<ModelInfo>, BackendError> {
    if let Some(error) = body.get("error") {
        return Err(BackendError::api(error_message(error)));
    }

    let models = body
        .get("models")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::protocol("Unexpected response format."))?;

    Ok(models
        .iter()
        .filter(|model| {
            model
                .get("supportedGenerationMethods")
                .and_then(Value::as_array)
                .is_some_and(|methods| {
                    methods
                        .iter()
                        .any(|m| m.as_str() == Some("generateContent"))
                })
        })
        .filter_map(|model| {
            let name = model.get("name").and_then(Value::as_str)?;
            Some(ModelInfo {
                id: name.trim_start_matches("models/").to_string(),
                display_name: model
                    .get("displayName")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect())
}

#[async_trait]
impl Backend for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloud
    }

    fn name(&self) -> &'static str {
        "Google Gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn submit(&self, prompt: &str) -> BackendResult {
        tracing::info!(model = %self.model, "querying gemini");
        self.request(prompt).await.into()
    }
}

// API types

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}
