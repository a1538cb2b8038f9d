//! Error types for the language-model analyst.
//!
//! None of these reach the simulator: every failure is logged and the
//! analyst answers with the catalog report instead.

/// Errors that can occur while producing an LLM-backed report.
#[derive(Debug, thiserror::Error)]
pub enum AnalystError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// The backend was unreachable or returned an unusable body.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The backend answered with a non-success HTTP status.
    #[error("LLM backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Explanation for the operator.
        message: String,
    },

    /// A model did not answer within the configured timeout.
    #[error("model {model} timed out after {timeout_ms}ms")]
    Timeout {
        /// The model that timed out.
        model: String,
        /// The timeout in milliseconds.
        timeout_ms: u128,
    },

    /// The completion parsed but carried no usable outcome.
    #[error("response parse error: {0}")]
    Parse(String),

    /// No recovery strategy turned the completion into valid outcome JSON.
    #[error("completion is not outcome JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AnalystError {
    /// Map a non-success HTTP status to an operator-facing error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match status {
            401 => String::from("Invalid API key. Check the ORACLE_LLM_API_KEY setting."),
            402 => String::from("All available models require payment. Check the account credits."),
            429 => String::from("Rate limit exceeded. Try again later."),
            _ => body.chars().take(500).collect(),
        };
        Self::Status { status, message }
    }
}
