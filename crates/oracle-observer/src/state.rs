//! Shared application state for the dashboard API.
//!
//! [`AppState`] owns the three dashboard components and the broadcast
//! channel that streams their changes to `WebSocket` clients. The
//! components report through [`BroadcastListener`], so every cursor move,
//! feed event and stored run reaches the channel without the handlers
//! having to publish anything.

use std::sync::Arc;

use oracle_analyst::AnalystBackend;
use oracle_core::catalog::ScenarioCatalog;
use oracle_core::config::OracleConfig;
use oracle_core::generator::{EventSource, FeedGenerator, FeedListener};
use oracle_core::playback::{TimelineListener, TimelinePlayback};
use oracle_core::scheduler::Scheduler;
use oracle_core::simulator::{RunListener, ScenarioSimulator};
use oracle_types::{CrisisEvent, ScenarioRun, TimelineSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the dashboard broadcast channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// The simulator as the server runs it.
pub type Simulator = ScenarioSimulator<AnalystBackend>;

/// One message on the dashboard stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardBroadcast {
    /// The time cursor changed.
    Timeline(TimelineSnapshot),
    /// A crisis event entered the feed.
    Event(CrisisEvent),
    /// A scenario run completed and was stored.
    Outcome(Box<ScenarioRun>),
}

/// Forwards component callbacks onto the broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<DashboardBroadcast>,
}

impl BroadcastListener {
    /// Create a listener publishing to `tx`.
    pub const fn new(tx: broadcast::Sender<DashboardBroadcast>) -> Self {
        Self { tx }
    }

    /// Returns the number of receivers reached; zero when nobody is
    /// subscribed.
    fn publish(&self, message: DashboardBroadcast) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

impl TimelineListener for BroadcastListener {
    fn on_change(&self, snapshot: &TimelineSnapshot) {
        self.publish(DashboardBroadcast::Timeline(snapshot.clone()));
    }
}

impl FeedListener for BroadcastListener {
    fn on_event(&self, event: &CrisisEvent) {
        self.publish(DashboardBroadcast::Event(event.clone()));
    }
}

impl RunListener for BroadcastListener {
    fn on_run(&self, run: &ScenarioRun) {
        self.publish(DashboardBroadcast::Outcome(Box::new(run.clone())));
    }
}

/// Shared state for the Axum application, injected via `State`.
pub struct AppState {
    /// Broadcast sender for dashboard messages.
    pub tx: broadcast::Sender<DashboardBroadcast>,
    /// The time cursor and its playback timer.
    pub timeline: TimelinePlayback,
    /// The crisis feed and its generator timer.
    pub feed: FeedGenerator,
    /// The what-if simulator.
    pub simulator: Simulator,
}

impl AppState {
    /// Wire the three components to one broadcast channel.
    ///
    /// The feed starts empty and stopped; the caller decides whether to
    /// prime it and go live.
    pub fn new(
        config: &OracleConfig,
        scheduler: Arc<dyn Scheduler>,
        source: Box<dyn EventSource>,
        catalog: Arc<ScenarioCatalog>,
        analyst: AnalystBackend,
    ) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let listener = Arc::new(BroadcastListener::new(tx.clone()));

        let timeline = TimelinePlayback::new(
            &config.timeline,
            Arc::clone(&scheduler),
            Arc::clone(&listener) as Arc<dyn TimelineListener>,
        );
        let feed = FeedGenerator::new(
            &config.feed,
            source,
            scheduler,
            Arc::clone(&listener) as Arc<dyn FeedListener>,
        );
        let simulator = ScenarioSimulator::new(catalog, analyst, &config.simulator)
            .with_listener(listener);

        Self {
            tx,
            timeline,
            feed,
            simulator,
        }
    }

    /// Subscribe to the dashboard stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardBroadcast> {
        self.tx.subscribe()
    }

    /// Stop every timer the components own.
    pub fn shutdown(&self) {
        self.timeline.pause();
        self.feed.stop();
    }
}
