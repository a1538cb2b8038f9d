//! Language-model scenario analyst for Oracle Earth.
//!
//! Plugs into the simulator through
//! [`ScenarioAnalyst`](oracle_core::analyst::ScenarioAnalyst). The analyst
//! renders a `minijinja` prompt, calls an `OpenAI`-compatible or Anthropic
//! endpoint over a chain of models, and parses the completion into an
//! [`OutcomeReport`](oracle_types::OutcomeReport). Any failure along the
//! way degrades to the static catalog report.
//!
//! # Modules
//!
//! - [`analyst`] -- [`LlmAnalyst`] and the startup-selected [`AnalystBackend`].
//! - [`config`] -- Environment-driven configuration.
//! - [`error`] -- Internal error type.
//! - [`llm`] -- HTTP backends with enum dispatch.
//! - [`parse`] -- Tolerant completion parsing and normalization.
//! - [`prompt`] -- Template loading and rendering.
//!
//! [`LlmAnalyst`]: analyst::LlmAnalyst
//! [`AnalystBackend`]: analyst::AnalystBackend

pub mod analyst;
pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;

pub use analyst::{AnalystBackend, LlmAnalyst};
pub use config::AnalystConfig;
pub use error::AnalystError;
