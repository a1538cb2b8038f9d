//! Configuration for the language-model analyst.
//!
//! All configuration is loaded from environment variables. Without an API
//! key there is no LLM analyst and the engine uses the catalog directly.

use std::time::Duration;

use crate::error::AnalystError;

/// Default `OpenAI`-compatible endpoint (`OpenRouter`).
pub const DEFAULT_OPENAI_URL: &str = "https://openrouter.ai/api/v1";
/// Default Anthropic Messages API endpoint.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";
/// Models tried in order until one answers.
pub const DEFAULT_MODELS: [&str; 4] = [
    "openai/gpt-oss-20b:free",
    "x-ai/grok-4-fast:free",
    "meta-llama/llama-3.2-3b-instruct:free",
    "google/gemma-2-9b-it:free",
];
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenRouter`, `OpenAI`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as operators write it.
    pub fn parse(name: &str) -> Result<Self, AnalystError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "openrouter" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(AnalystError::Config(format!("unknown backend type: {other}"))),
        }
    }

    const fn default_url(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_URL,
            Self::Anthropic => DEFAULT_ANTHROPIC_URL,
        }
    }
}

/// Complete analyst configuration.
#[derive(Debug, Clone)]
pub struct AnalystConfig {
    /// Which API dialect to speak.
    pub backend_type: BackendType,
    /// Base API URL (without trailing slash).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Models tried in order.
    pub models: Vec<String>,
    /// Per-model deadline.
    pub timeout: Duration,
    /// Directory with `system.j2` and `user.j2` overriding the embedded
    /// templates.
    pub templates_dir: Option<String>,
}

impl AnalystConfig {
    /// Load configuration from the process environment.
    ///
    /// Returns `Ok(None)` when `ORACLE_LLM_API_KEY` is unset or empty.
    ///
    /// Variables:
    /// - `ORACLE_LLM_API_KEY` -- API key; enables the analyst
    /// - `ORACLE_LLM_BACKEND` -- `openai` (default) or `anthropic`
    /// - `ORACLE_LLM_API_URL` -- base URL (default depends on backend)
    /// - `ORACLE_LLM_MODELS` -- comma-separated model chain
    /// - `ORACLE_LLM_TIMEOUT_MS` -- per-model timeout (default 15000)
    /// - `ORACLE_LLM_TEMPLATES_DIR` -- prompt template directory
    pub fn from_env() -> Result<Option<Self>, AnalystError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, AnalystError> {
        let Some(api_key) = lookup("ORACLE_LLM_API_KEY").filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let backend_type = lookup("ORACLE_LLM_BACKEND")
            .map_or(Ok(BackendType::OpenAi), |b| BackendType::parse(&b))?;

        let api_url = lookup("ORACLE_LLM_API_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| backend_type.default_url().to_owned())
            .trim_end_matches('/')
            .to_owned();

        let models: Vec<String> = lookup("ORACLE_LLM_MODELS").map_or_else(
            || DEFAULT_MODELS.iter().map(|&m| m.to_owned()).collect(),
            |list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            },
        );
        if models.is_empty() {
            return Err(AnalystError::Config(
                "ORACLE_LLM_MODELS must name at least one model".to_owned(),
            ));
        }

        let timeout_ms: u64 = lookup("ORACLE_LLM_TIMEOUT_MS")
            .map_or(Ok(DEFAULT_TIMEOUT_MS), |v| v.trim().parse())
            .map_err(|e| AnalystError::Config(format!("invalid ORACLE_LLM_TIMEOUT_MS: {e}")))?;

        Ok(Some(Self {
            backend_type,
            api_url,
            api_key,
            models,
            timeout: Duration::from_millis(timeout_ms),
            templates_dir: lookup("ORACLE_LLM_TEMPLATES_DIR"),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Option<AnalystConfig>, AnalystError> {
        let map: HashMap<String, String> =
            vars.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect();
        AnalystConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn no_key_means_no_analyst() {
        assert!(load(&[]).unwrap().is_none());
        assert!(load(&[("ORACLE_LLM_API_KEY", "  ")]).unwrap().is_none());
    }

    #[test]
    fn defaults_target_openrouter_chain() {
        let config = load(&[("ORACLE_LLM_API_KEY", "sk-test")]).unwrap().unwrap();
        assert_eq!(config.backend_type, BackendType::OpenAi);
        assert_eq!(config.api_url, DEFAULT_OPENAI_URL);
        assert_eq!(config.models.len(), 4);
        assert_eq!(config.models.first().map(String::as_str), Some("openai/gpt-oss-20b:free"));
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn explicit_settings_are_honoured() {
        let config = load(&[
            ("ORACLE_LLM_API_KEY", "key"),
            ("ORACLE_LLM_BACKEND", "Claude"),
            ("ORACLE_LLM_API_URL", "http://localhost:9000/v1/"),
            ("ORACLE_LLM_MODELS", "a, b ,,c"),
            ("ORACLE_LLM_TIMEOUT_MS", "500"),
        ])
        .unwrap()
        .unwrap();
        assert_eq!(config.backend_type, BackendType::Anthropic);
        assert_eq!(config.api_url, "http://localhost:9000/v1");
        assert_eq!(config.models, vec!["a", "b", "c"]);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("ORACLE_LLM_API_KEY", "k"), ("ORACLE_LLM_BACKEND", "palm")]).is_err());
        assert!(load(&[("ORACLE_LLM_API_KEY", "k"), ("ORACLE_LLM_TIMEOUT_MS", "soon")]).is_err());
        assert!(load(&[("ORACLE_LLM_API_KEY", "k"), ("ORACLE_LLM_MODELS", " , ")]).is_err());
    }
}
