//! Scenario analyst trait and the static catalog implementation.
//!
//! The simulator hands every evaluation to a [`ScenarioAnalyst`]. The
//! analyst turns a scenario plus effective parameters into an
//! [`OutcomeReport`]. It has no error channel: an analyst that cannot
//! produce a report of its own must fall back to something that can.
//!
//! [`CatalogAnalyst`] returns the static outcome tables from the
//! [`ScenarioCatalog`]. A language-model analyst lives in a separate crate
//! and wraps a `CatalogAnalyst` as its fallback.

use std::future::Future;
use std::sync::Arc;

use oracle_types::{OutcomeReport, ParameterSet, Scenario};

use crate::catalog::ScenarioCatalog;

/// Everything an analyst gets to see about one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// The requested scenario id, known to the catalog or not.
    pub scenario_id: String,
    /// The catalog entry, when the id is known.
    pub scenario: Option<Scenario>,
    /// Clamped overrides supplied by the caller.
    pub overrides: ParameterSet,
    /// Base parameters merged with the overrides.
    pub parameters: ParameterSet,
}

impl AnalysisRequest {
    /// Title to report under: the catalog title or the raw id.
    pub fn title(&self) -> &str {
        self.scenario.as_ref().map_or(self.scenario_id.as_str(), |s| s.title.as_str())
    }
}

/// A source of scenario outcome reports.
pub trait ScenarioAnalyst: Send + Sync {
    /// Produce a fully populated report for `request`.
    fn analyze(&self, request: &AnalysisRequest) -> impl Future<Output = OutcomeReport> + Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Analyst backed by the static outcome tables.
///
/// The report depends only on the scenario id; parameters are ignored.
#[derive(Debug, Clone)]
pub struct CatalogAnalyst {
    catalog: Arc<ScenarioCatalog>,
}

impl CatalogAnalyst {
    /// Create an analyst over `catalog`.
    pub const fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    /// Synchronous form of [`ScenarioAnalyst::analyze`].
    pub fn report(&self, request: &AnalysisRequest) -> OutcomeReport {
        self.catalog.report(&request.scenario_id)
    }

    /// The catalog this analyst reads from.
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }
}

impl Default for CatalogAnalyst {
    fn default() -> Self {
        Self::new(Arc::new(ScenarioCatalog::standard()))
    }
}

impl ScenarioAnalyst for CatalogAnalyst {
    async fn analyze(&self, request: &AnalysisRequest) -> OutcomeReport {
        self.report(request)
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}
