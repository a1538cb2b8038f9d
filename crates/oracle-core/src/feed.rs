//! The crisis feed: a bounded, newest-first list of [`CrisisEvent`]s.
//!
//! The feed owns ordering and eviction only. Where events come from is the
//! business of [`crate::generator`].

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use oracle_types::{CrisisEvent, EventCategory, Severity};
use serde::{Deserialize, Serialize};

/// Category projection of the feed: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    /// Every event.
    #[default]
    All,
    /// Only events of the given category.
    Only(EventCategory),
}

impl CategoryFilter {
    /// Whether `event` passes the filter.
    pub fn matches(self, event: &CrisisEvent) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => event.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => f.write_str(category.as_str()),
        }
    }
}

/// Error returned when a category filter string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category filter {0:?} (expected \"all\" or an event category)")]
pub struct UnknownCategory(pub String);

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        EventCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .map(Self::Only)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

/// Bounded crisis feed, newest event first.
#[derive(Debug, Clone)]
pub struct EventFeed {
    events: VecDeque<CrisisEvent>,
    capacity: usize,
    live: bool,
}

impl EventFeed {
    /// Create an empty, live feed holding at most `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            live: true,
        }
    }

    /// Insert `event` at the front, evicting the oldest event past capacity.
    ///
    /// Returns the evicted event, if any.
    pub fn push(&mut self, event: CrisisEvent) -> Option<CrisisEvent> {
        self.events.push_front(event);
        if self.events.len() > self.capacity {
            self.events.pop_back()
        } else {
            None
        }
    }

    /// Events newest first.
    pub fn events(&self) -> Vec<CrisisEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the feed holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether new events are being generated.
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Turn live generation on or off. Existing events are kept.
    pub const fn set_live(&mut self, live: bool) {
        self.live = live;
    }

    /// Events passing `filter`, in feed order.
    pub fn filter_by(&self, filter: CategoryFilter) -> Vec<CrisisEvent> {
        self.events.iter().filter(|e| filter.matches(e)).cloned().collect()
    }

    /// Events at or above the `min` alert threshold, in feed order.
    pub fn at_or_above(&self, min: Severity) -> Vec<CrisisEvent> {
        self.events.iter().filter(|e| e.severity >= min).cloned().collect()
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Relative age of an event: "Just now", "5m ago", "3h ago", "2d ago".
///
/// Timestamps in the future read as "Just now".
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(created_at).num_minutes();
    if minutes < 1 {
        String::from("Just now")
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes.checked_div(60).unwrap_or(0))
    } else {
        format!("{}d ago", minutes.checked_div(1440).unwrap_or(0))
    }
}
