//! Language-model scenario analyst with catalog fallback.
//!
//! [`LlmAnalyst`] renders a prompt, walks the configured model chain with a
//! per-model deadline, and parses the first usable completion. Whenever the
//! chain is exhausted (bad key, rate limits, timeouts, unparseable output)
//! it answers with the catalog report, so the simulator never sees an error.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oracle_core::analyst::{AnalysisRequest, CatalogAnalyst, ScenarioAnalyst};
use oracle_core::catalog::ScenarioCatalog;
use oracle_types::OutcomeReport;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AnalystConfig;
use crate::error::AnalystError;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::parse_outcome;
use crate::prompt::PromptEngine;

/// Analyst that asks a language model and falls back to the catalog.
pub struct LlmAnalyst {
    backend: LlmBackend,
    models: Vec<String>,
    model_timeout: Duration,
    prompts: PromptEngine,
    fallback: CatalogAnalyst,
}

impl LlmAnalyst {
    /// Build an analyst from `config`, answering with `fallback` on failure.
    pub fn new(config: &AnalystConfig, fallback: CatalogAnalyst) -> Result<Self, AnalystError> {
        let prompts = match &config.templates_dir {
            Some(dir) => PromptEngine::from_dir(Path::new(dir))?,
            None => PromptEngine::embedded()?,
        };
        Ok(Self {
            backend: create_backend(config),
            models: config.models.clone(),
            model_timeout: config.timeout,
            prompts,
            fallback,
        })
    }

    /// Models in the order they are tried.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    async fn ask_models(
        &self,
        request: &AnalysisRequest,
        fallback: &OutcomeReport,
    ) -> Result<OutcomeReport, AnalystError> {
        let prompt = self.prompts.render(request)?;
        let mut last_error = AnalystError::Config("no models configured".to_owned());

        for model in &self.models {
            let start = Instant::now();
            let completion = timeout(self.model_timeout, self.backend.complete(&prompt, model))
                .await
                .unwrap_or_else(|_elapsed| {
                    Err(AnalystError::Timeout {
                        model: model.clone(),
                        timeout_ms: self.model_timeout.as_millis(),
                    })
                });

            match completion.and_then(|text| parse_outcome(&text, fallback)) {
                Ok(report) => {
                    info!(
                        scenario_id = %request.scenario_id,
                        model = %model,
                        backend = self.backend.name(),
                        latency_ms = start.elapsed().as_millis(),
                        "scenario analysed by model"
                    );
                    return Ok(report);
                }
                Err(e) => {
                    debug!(
                        scenario_id = %request.scenario_id,
                        model = %model,
                        error = %e,
                        "model attempt failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

impl ScenarioAnalyst for LlmAnalyst {
    async fn analyze(&self, request: &AnalysisRequest) -> OutcomeReport {
        let fallback = self.fallback.report(request);
        match self.ask_models(request, &fallback).await {
            Ok(report) => report,
            Err(e) => {
                warn!(
                    scenario_id = %request.scenario_id,
                    error = %e,
                    "all models failed, using catalog outcome"
                );
                fallback
            }
        }
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// The analyst the engine runs with, chosen at startup.
pub enum AnalystBackend {
    /// Static catalog outcomes only.
    Catalog(CatalogAnalyst),
    /// Language model with catalog fallback.
    Llm(Box<LlmAnalyst>),
}

impl AnalystBackend {
    /// Pick the analyst from the process environment.
    ///
    /// Without `ORACLE_LLM_API_KEY` this is the catalog analyst.
    pub fn from_env(catalog: Arc<ScenarioCatalog>) -> Result<Self, AnalystError> {
        Self::from_config(AnalystConfig::from_env()?.as_ref(), catalog)
    }

    /// Pick the analyst from an already loaded configuration.
    pub fn from_config(
        config: Option<&AnalystConfig>,
        catalog: Arc<ScenarioCatalog>,
    ) -> Result<Self, AnalystError> {
        let fallback = CatalogAnalyst::new(catalog);
        match config {
            Some(config) => {
                let analyst = LlmAnalyst::new(config, fallback)?;
                info!(
                    backend = analyst.backend.name(),
                    models = ?analyst.models,
                    "LLM scenario analyst enabled"
                );
                Ok(Self::Llm(Box::new(analyst)))
            }
            None => {
                info!("no LLM API key configured, using catalog outcomes");
                Ok(Self::Catalog(fallback))
            }
        }
    }
}

impl ScenarioAnalyst for AnalystBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> OutcomeReport {
        match self {
            Self::Catalog(analyst) => analyst.analyze(request).await,
            Self::Llm(analyst) => analyst.analyze(request).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Catalog(analyst) => analyst.name(),
            Self::Llm(analyst) => analyst.name(),
        }
    }
}
