//! Error types for the Oracle Earth binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps the failure of one startup or serving step so that
/// `main` can propagate it with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: oracle_core::config::ConfigError,
    },

    /// The scenario analyst could not be constructed.
    #[error("analyst error: {source}")]
    Analyst {
        /// The underlying analyst error.
        #[from]
        source: oracle_analyst::AnalystError,
    },

    /// The dashboard API server failed to bind or serve.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: oracle_observer::ServerError,
    },

    /// No tokio runtime was available to schedule timers on.
    #[error("runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure.
        message: String,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },
}
