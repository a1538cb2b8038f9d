//! LLM backend abstraction and implementations.
//!
//! Enum dispatch over the two supported HTTP dialects: `OpenAI`-compatible
//! chat completions (the default, pointed at `OpenRouter`) and the Anthropic
//! Messages API. The model is chosen per call so one backend can walk the
//! whole fallback chain.

use crate::config::{AnalystConfig, BackendType};
use crate::error::AnalystError;
use crate::prompt::RenderedPrompt;

const REFERER: &str = "https://oracle-earth.vercel.app";
const APP_TITLE: &str = "Oracle Earth - AI Brain of Our Planet";
const MAX_TOKENS: u32 = 1000;

/// An LLM backend that turns a prompt into completion text.
pub enum LlmBackend {
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send `prompt` to `model` and return the completion text.
    pub async fn complete(
        &self,
        prompt: &RenderedPrompt,
        model: &str,
    ) -> Result<String, AnalystError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt, model).await,
            Self::Anthropic(backend) => backend.complete(prompt, model).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

/// Backend for `OpenAI`-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions` with the `OpenRouter`
/// attribution headers.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &AnalystConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt, model: &str) -> Result<String, AnalystError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": 0.7,
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalystError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(AnalystError::from_status(status.as_u16(), &error_body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalystError::LlmBackend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, AnalystError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AnalystError::LlmBackend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Backend for the Anthropic Messages API.
///
/// The system prompt is a top-level field and authentication goes through
/// `x-api-key`.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &AnalystConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt, model: &str) -> Result<String, AnalystError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalystError::LlmBackend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(AnalystError::from_status(status.as_u16(), &error_body));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            AnalystError::LlmBackend(format!("Anthropic response parse failed: {e}"))
        })?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, AnalystError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AnalystError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

/// Create an LLM backend from configuration.
pub fn create_backend(config: &AnalystConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
    }
}
