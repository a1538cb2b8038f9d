//! The scenario simulator: run lifecycle around a [`ScenarioAnalyst`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle --evaluate--> Running --report--> Completed --reset--> Idle
//!                       |                    |
//!                       +------reset---------+--> Idle
//! ```
//!
//! Only one evaluation runs at a time. A second submission while
//! `Running` is rejected with [`SimulatorError::Busy`] and changes
//! nothing. Resetting while a run is in flight lets that run finish for
//! its caller, but its report does not repopulate the cleared state.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use oracle_types::{
    ParameterSet, RunId, RunPhase, Scenario, ScenarioRun, SimulatorSnapshot,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::analyst::{AnalysisRequest, ScenarioAnalyst};
use crate::catalog::ScenarioCatalog;
use crate::config::SimulatorConfig;

/// Admission errors from the simulator. Evaluation itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulatorError {
    /// An evaluation is already in flight.
    #[error("an evaluation is already running")]
    Busy,

    /// `run_selected` or `adjust` was called with no scenario selected.
    #[error("no scenario is selected")]
    NothingSelected,

    /// `select` was called with an id the catalog does not know.
    #[error("unknown scenario: {id}")]
    UnknownScenario {
        /// The rejected scenario id.
        id: String,
    },

    /// `adjust` named a parameter the selected scenario does not have.
    #[error("scenario {scenario_id} has no parameter {name}")]
    UnknownParameter {
        /// The selected scenario.
        scenario_id: String,
        /// The rejected parameter name.
        name: String,
    },
}

/// Receives every run whose report was stored.
pub trait RunListener: Send + Sync {
    /// Called after a run completed and became the last run.
    fn on_run(&self, run: &ScenarioRun);
}

/// A listener that ignores every run.
pub struct NoOpRunListener;

impl RunListener for NoOpRunListener {
    fn on_run(&self, _run: &ScenarioRun) {}
}

#[derive(Debug)]
struct SimState {
    phase: RunPhase,
    /// Bumped by `reset`; runs started under an older generation are
    /// not stored.
    generation: u64,
    selected: Option<String>,
    pending: ParameterSet,
    last_run: Option<ScenarioRun>,
}

/// Returns the phase to `Idle` if an evaluation future is dropped mid-run.
struct RunGuard<'a> {
    state: &'a Mutex<SimState>,
    generation: u64,
    armed: bool,
}

impl RunGuard<'_> {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.phase == RunPhase::Running {
            state.phase = RunPhase::Idle;
            warn!("Scenario evaluation cancelled before completion");
        }
    }
}

/// What-if scenario evaluator.
pub struct ScenarioSimulator<A> {
    catalog: Arc<ScenarioCatalog>,
    analyst: A,
    presentation_delay: Duration,
    listener: Arc<dyn RunListener>,
    state: Mutex<SimState>,
}

impl<A: ScenarioAnalyst> ScenarioSimulator<A> {
    /// Create an idle simulator.
    pub fn new(catalog: Arc<ScenarioCatalog>, analyst: A, config: &SimulatorConfig) -> Self {
        Self {
            catalog,
            analyst,
            presentation_delay: config.presentation_delay(),
            listener: Arc::new(NoOpRunListener),
            state: Mutex::new(SimState {
                phase: RunPhase::Idle,
                generation: 0,
                selected: None,
                pending: ParameterSet::new(),
                last_run: None,
            }),
        }
    }

    /// Notify `listener` about every stored run.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listener = listener;
        self
    }

    /// The scenario catalog.
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// The fixed list of scenarios.
    pub fn list_scenarios(&self) -> &[Scenario] {
        self.catalog.scenarios()
    }

    /// The analyst producing reports.
    pub const fn analyst(&self) -> &A {
        &self.analyst
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.lock().phase
    }

    /// Read-only view of selection, pending overrides and the last run.
    pub fn snapshot(&self) -> SimulatorSnapshot {
        let state = self.lock();
        SimulatorSnapshot {
            phase: state.phase,
            selected_scenario_id: state.selected.clone(),
            pending_overrides: state.pending.clone(),
            last_run: state.last_run.clone(),
        }
    }

    /// Evaluate `scenario_id` with the given parameter overrides.
    ///
    /// Unknown ids produce the generic report. Overrides are clamped into
    /// range and unknown names dropped. The call resolves once both the
    /// analysis and the presentation delay have finished.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Busy`] if another evaluation is running.
    pub async fn evaluate(
        &self,
        scenario_id: &str,
        overrides: &ParameterSet,
    ) -> Result<ScenarioRun, SimulatorError> {
        let generation = {
            let mut state = self.lock();
            if state.phase == RunPhase::Running {
                warn!(scenario = scenario_id, "Evaluation rejected, simulator busy");
                return Err(SimulatorError::Busy);
            }
            state.phase = RunPhase::Running;
            state.generation
        };
        let mut guard = RunGuard {
            state: &self.state,
            generation,
            armed: true,
        };

        let started_at = Utc::now();
        let clamped = self.catalog.clamp_overrides(scenario_id, overrides);
        let request = AnalysisRequest {
            scenario_id: scenario_id.to_owned(),
            scenario: self.catalog.get(scenario_id).cloned(),
            parameters: self.catalog.merge(scenario_id, &clamped),
            overrides: clamped,
        };
        info!(
            scenario = scenario_id,
            analyst = self.analyst.name(),
            overrides = request.overrides.len(),
            "Evaluating scenario"
        );

        let (outcome, ()) = tokio::join!(
            self.analyst.analyze(&request),
            tokio::time::sleep(self.presentation_delay)
        );

        let run = ScenarioRun {
            id: RunId::new(),
            scenario_id: request.scenario_id,
            overrides: request.overrides,
            parameters: request.parameters,
            outcome,
            started_at,
            completed_at: Utc::now(),
        };

        let stored = {
            let mut state = self.lock();
            guard.disarm();
            if state.generation == generation {
                state.phase = RunPhase::Completed;
                state.last_run = Some(run.clone());
                true
            } else {
                false
            }
        };

        if stored {
            info!(
                scenario = %run.scenario_id,
                probability = run.outcome.probability_percent,
                impact = %run.outcome.global_impact_score,
                "Scenario evaluated"
            );
            self.listener.on_run(&run);
        } else {
            debug!(scenario = %run.scenario_id, "Simulator was reset during evaluation, report not stored");
        }
        Ok(run)
    }

    /// Select a catalog scenario. Pending overrides are cleared when the
    /// selection changes.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::UnknownScenario`] for ids outside the catalog.
    pub fn select(&self, scenario_id: &str) -> Result<SimulatorSnapshot, SimulatorError> {
        if self.catalog.get(scenario_id).is_none() {
            return Err(SimulatorError::UnknownScenario {
                id: scenario_id.to_owned(),
            });
        }
        {
            let mut state = self.lock();
            if state.selected.as_deref() != Some(scenario_id) {
                state.pending.clear();
                state.selected = Some(scenario_id.to_owned());
            }
        }
        debug!(scenario = scenario_id, "Scenario selected");
        Ok(self.snapshot())
    }

    /// Stage an override for the selected scenario. Returns the clamped
    /// value that was stored.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::NothingSelected`] without a selection and
    /// [`SimulatorError::UnknownParameter`] for names the scenario lacks.
    pub fn adjust(&self, name: &str, value: Decimal) -> Result<Decimal, SimulatorError> {
        let mut state = self.lock();
        let scenario_id = state.selected.clone().ok_or(SimulatorError::NothingSelected)?;
        let clamped = self.catalog.clamp_value(&scenario_id, name, value).ok_or_else(|| {
            SimulatorError::UnknownParameter {
                scenario_id: scenario_id.clone(),
                name: name.to_owned(),
            }
        })?;
        state.pending.insert(name.to_owned(), clamped);
        debug!(scenario = %scenario_id, parameter = name, %value, %clamped, "Parameter adjusted");
        Ok(clamped)
    }

    /// Evaluate the selected scenario with the staged overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::NothingSelected`] without a selection and
    /// [`SimulatorError::Busy`] while another evaluation is running.
    pub async fn run_selected(&self) -> Result<ScenarioRun, SimulatorError> {
        let (scenario_id, overrides) = {
            let state = self.lock();
            let id = state.selected.clone().ok_or(SimulatorError::NothingSelected)?;
            (id, state.pending.clone())
        };
        self.evaluate(&scenario_id, &overrides).await
    }

    /// Clear selection, staged overrides and the last run.
    pub fn reset(&self) -> SimulatorSnapshot {
        {
            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            state.phase = RunPhase::Idle;
            state.selected = None;
            state.pending.clear();
            state.last_run = None;
        }
        info!("Simulator reset");
        self.snapshot()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
