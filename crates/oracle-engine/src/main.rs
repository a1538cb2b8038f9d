//! Oracle Earth binary entry point.
//!
//! Loads configuration, installs the log subscriber, wires the time
//! cursor, crisis feed and scenario simulator to one dashboard broadcast
//! channel, and serves the dashboard API until Ctrl-C.

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oracle_analyst::AnalystBackend;
use oracle_core::analyst::ScenarioAnalyst;
use oracle_core::catalog::ScenarioCatalog;
use oracle_core::config::{LogFormat, LoggingConfig, OracleConfig};
use oracle_core::generator::SyntheticEventSource;
use oracle_core::scheduler::TokioScheduler;
use oracle_observer::{AppState, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file used when `ORACLE_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "oracle-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration (file, defaults, env overrides).
    let config_path = config_path(|key| std::env::var(key).ok());
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize tracing.
    init_tracing(&config.logging)?;
    info!(
        path = %config_path.display(),
        from_file,
        "oracle-engine starting"
    );

    // 3. Timers run on the current runtime.
    let scheduler = TokioScheduler::from_current().ok_or_else(|| EngineError::Runtime {
        message: "no tokio runtime in scope".to_owned(),
    })?;

    // 4. Scenario catalog and analyst.
    let catalog = Arc::new(ScenarioCatalog::standard());
    let analyst = AnalystBackend::from_env(Arc::clone(&catalog)).map_err(EngineError::from)?;
    let scenarios = catalog.scenarios().len();

    // 5. Wire the dashboard components.
    let source = SyntheticEventSource::from_config(&config.feed);
    let state = Arc::new(AppState::new(
        &config,
        Arc::new(scheduler),
        Box::new(source),
        catalog,
        analyst,
    ));
    info!(
        scenarios,
        analyst = state.simulator.analyst().name(),
        "scenario simulator ready"
    );

    // 6. Seed the crisis feed and go live.
    let primed = state.feed.prime(config.feed.initial_events);
    if config.feed.live_on_start {
        state.feed.start();
    }
    info!(
        primed,
        live = state.feed.is_live(),
        interval_ms = config.feed.tick_interval_ms,
        "crisis feed ready"
    );

    // 7. Serve until Ctrl-C.
    let served = start_server(&config.server, Arc::clone(&state), shutdown_signal()).await;

    // 8. Stop the timers whatever the server outcome.
    state.shutdown();
    served.map_err(EngineError::from)?;

    info!("oracle-engine shutdown complete");
    Ok(())
}

/// Resolve the config file path from `ORACLE_CONFIG`.
fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("ORACLE_CONFIG")
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration, falling back to defaults when the file is
/// absent. The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(OracleConfig, bool), EngineError> {
    if path.exists() {
        return Ok((OracleConfig::from_file(path)?, true));
    }
    let mut config = OracleConfig::default();
    config.server.apply_env_overrides()?;
    config.validate()?;
    Ok((config, false))
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter {:?}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Resolves on Ctrl-C. A failed signal handler keeps the server running.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
