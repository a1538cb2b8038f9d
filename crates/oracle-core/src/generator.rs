//! Crisis feed generation.
//!
//! An [`EventSource`] produces candidate events; the [`FeedGenerator`]
//! polls it on a repeating schedule while the feed is live and pushes the
//! results into the shared [`EventFeed`]. The eviction contract lives in
//! the feed, so swapping the synthetic source for a real ingestion
//! pipeline changes nothing downstream.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use oracle_types::{Coordinates, CrisisEvent, EventCategory, EventId, Severity};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::feed::{CategoryFilter, EventFeed};
use crate::scheduler::{ScheduleHandle, Scheduler, TickControl};

/// Producer of crisis events.
pub trait EventSource: Send {
    /// Called once per generation tick. `None` means nothing happened.
    fn poll(&mut self) -> Option<CrisisEvent>;

    /// Up to `count` events used to seed an empty feed.
    fn backfill(&mut self, count: usize) -> Vec<CrisisEvent> {
        (0..count).filter_map(|_| self.poll()).collect()
    }
}

// ---------------------------------------------------------------------------
// Synthetic source
// ---------------------------------------------------------------------------

struct EventTemplate {
    title: &'static str,
    location: &'static str,
    category: EventCategory,
    description: &'static str,
}

const TEMPLATES: [EventTemplate; 5] = [
    EventTemplate {
        title: "Cyber Attack on Infrastructure",
        location: "Eastern Europe",
        category: EventCategory::Terrorism,
        description: "Major cyber attack targeting power grid systems",
    },
    EventTemplate {
        title: "Wildfire Spreading Rapidly",
        location: "California, USA",
        category: EventCategory::Environment,
        description: "Forest fires threatening residential areas",
    },
    EventTemplate {
        title: "Border Tensions Escalating",
        location: "South China Sea",
        category: EventCategory::Conflict,
        description: "Naval vessels from multiple nations in standoff",
    },
    EventTemplate {
        title: "Market Volatility Spike",
        location: "Global Markets",
        category: EventCategory::Economy,
        description: "Sudden drop in major stock indices worldwide",
    },
    EventTemplate {
        title: "Earthquake Magnitude 6.2",
        location: "Pacific Ring of Fire",
        category: EventCategory::Natural,
        description: "Seismic activity detected, tsunami warning issued",
    },
];

/// Random events drawn from a fixed set of templates.
///
/// Each poll fires with `spawn_probability`; a fired event gets a uniform
/// template, a uniform severity and random coordinates.
pub struct SyntheticEventSource<R> {
    rng: R,
    spawn_probability: f64,
}

impl<R: Rng> SyntheticEventSource<R> {
    /// Create a source using `rng`. The probability is clamped to `[0, 1]`.
    pub fn new(rng: R, spawn_probability: f64) -> Self {
        let spawn_probability = if spawn_probability.is_nan() {
            0.0
        } else {
            spawn_probability.clamp(0.0, 1.0)
        };
        Self {
            rng,
            spawn_probability,
        }
    }

    /// Produce one event unconditionally.
    pub fn generate(&mut self) -> Option<CrisisEvent> {
        let template = TEMPLATES.choose(&mut self.rng)?;
        let severity = *Severity::ALL.choose(&mut self.rng)?;
        let coordinates = Coordinates {
            latitude: self.rng.random_range(-90.0..90.0),
            longitude: self.rng.random_range(-180.0..180.0),
        };
        Some(CrisisEvent {
            id: EventId::new(),
            title: template.title.to_owned(),
            location: template.location.to_owned(),
            severity,
            category: template.category,
            created_at: Utc::now(),
            description: template.description.to_owned(),
            coordinates: Some(coordinates),
        })
    }
}

impl SyntheticEventSource<SmallRng> {
    /// Build from config: seeded when `feed.seed` is set, OS entropy otherwise.
    pub fn from_config(config: &FeedConfig) -> Self {
        let rng = config.seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self::new(rng, config.spawn_probability)
    }
}

impl<R: Rng + Send> EventSource for SyntheticEventSource<R> {
    fn poll(&mut self) -> Option<CrisisEvent> {
        if self.rng.random::<f64>() < self.spawn_probability {
            self.generate()
        } else {
            None
        }
    }

    fn backfill(&mut self, count: usize) -> Vec<CrisisEvent> {
        (0..count).filter_map(|_| self.generate()).collect()
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Receives every event added to the feed.
pub trait FeedListener: Send + Sync {
    /// Called after `event` has been pushed into the feed.
    fn on_event(&self, event: &CrisisEvent);
}

/// A listener that ignores every event.
pub struct NoOpFeedListener;

impl FeedListener for NoOpFeedListener {
    fn on_event(&self, _event: &CrisisEvent) {}
}

/// Owns the feed and the timer that fills it.
pub struct FeedGenerator {
    feed: Arc<Mutex<EventFeed>>,
    source: Arc<Mutex<Box<dyn EventSource>>>,
    scheduler: Arc<dyn Scheduler>,
    listener: Arc<dyn FeedListener>,
    period: Duration,
    task: Mutex<Option<ScheduleHandle>>,
}

impl FeedGenerator {
    /// Create a stopped generator over an empty feed.
    ///
    /// Call [`prime`](Self::prime) to seed the feed and
    /// [`start`](Self::start) to begin live generation.
    pub fn new(
        config: &FeedConfig,
        source: Box<dyn EventSource>,
        scheduler: Arc<dyn Scheduler>,
        listener: Arc<dyn FeedListener>,
    ) -> Self {
        let mut feed = EventFeed::new(config.capacity);
        feed.set_live(false);
        Self {
            feed: Arc::new(Mutex::new(feed)),
            source: Arc::new(Mutex::new(source)),
            scheduler,
            listener,
            period: config.tick_interval(),
            task: Mutex::new(None),
        }
    }

    /// Seed the feed with up to `count` events from the source.
    ///
    /// Returns the number of events added.
    pub fn prime(&self, count: usize) -> usize {
        let events = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .backfill(count);
        let added = events.len();
        for event in events {
            push_and_notify(&self.feed, self.listener.as_ref(), event);
        }
        debug!(added, "Feed primed");
        added
    }

    /// Turn live generation on. Calling `start` twice keeps one timer.
    pub fn start(&self) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).set_live(true);

        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(ScheduleHandle::is_active) {
            return;
        }
        let feed = Arc::clone(&self.feed);
        let source = Arc::clone(&self.source);
        let listener = Arc::clone(&self.listener);
        *slot = Some(self.scheduler.schedule_repeating(
            self.period,
            Box::new(move || {
                if !feed.lock().unwrap_or_else(PoisonError::into_inner).is_live() {
                    return TickControl::Stop;
                }
                let polled = source.lock().unwrap_or_else(PoisonError::into_inner).poll();
                if let Some(event) = polled {
                    debug!(title = %event.title, severity = %event.severity, "Crisis event generated");
                    push_and_notify(&feed, listener.as_ref(), event);
                }
                TickControl::Continue
            }),
        ));
        info!(period_ms = self.period.as_millis(), "Crisis feed live");
    }

    /// Turn live generation off and cancel the timer. Events are kept.
    pub fn stop(&self) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).set_live(false);
        let handle = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.cancel();
        }
        info!("Crisis feed paused");
    }

    /// Start or stop depending on `live`.
    pub fn set_live(&self, live: bool) {
        if live {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Whether live generation is on.
    pub fn is_live(&self) -> bool {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).is_live()
    }

    /// Events newest first.
    pub fn events(&self) -> Vec<CrisisEvent> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).events()
    }

    /// Events passing `filter`, newest first.
    pub fn filter_by(&self, filter: CategoryFilter) -> Vec<CrisisEvent> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).filter_by(filter)
    }

    /// Events at or above `min`, newest first.
    pub fn at_or_above(&self, min: Severity) -> Vec<CrisisEvent> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).at_or_above(min)
    }
}

fn push_and_notify(feed: &Mutex<EventFeed>, listener: &dyn FeedListener, event: CrisisEvent) {
    let evicted = feed.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    if let Some(old) = evicted {
        debug!(id = %old.id, "Evicted oldest crisis event");
    }
    listener.on_event(&event);
}
