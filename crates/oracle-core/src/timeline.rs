//! The time cursor: a year on a bounded timeline with play/pause state.
//!
//! [`TimeCursor`] is a plain state machine. It knows nothing about timers;
//! [`crate::playback::TimelinePlayback`] drives [`TimeCursor::advance`]
//! from a scheduler. Every operation is infallible: out-of-range years are
//! clamped into `[min_year, max_year]`, never rejected.

use oracle_types::{
    Milestone, MilestoneKind, PlaybackSpeed, QuickJump, TimelineLabel, TimelineSnapshot,
};

use crate::config::TimelineConfig;

/// Historical and projected milestones shown alongside the cursor.
const MILESTONES: [(i32, &str, MilestoneKind); 11] = [
    (1990, "End of Cold War", MilestoneKind::Conflict),
    (1995, "Kyoto Protocol discussions begin", MilestoneKind::Environment),
    (2001, "9/11 Attacks", MilestoneKind::Terrorism),
    (2008, "Global Financial Crisis", MilestoneKind::Economy),
    (2011, "Arab Spring", MilestoneKind::Conflict),
    (2015, "Paris Climate Agreement", MilestoneKind::Environment),
    (2020, "COVID-19 Pandemic", MilestoneKind::Global),
    (2022, "Russia-Ukraine War", MilestoneKind::Conflict),
    (2024, "Present Day", MilestoneKind::Current),
    (2030, "Climate Targets Deadline", MilestoneKind::Future),
    (2050, "Net Zero Goals", MilestoneKind::Future),
];

/// The full milestone catalog in chronological order.
pub fn milestones() -> Vec<Milestone> {
    MILESTONES.iter().map(|&(year, title, kind)| to_milestone(year, title, kind)).collect()
}

/// The milestone shown for `year`: the exact match, otherwise the nearest.
///
/// On equal distance the earlier entry wins.
pub fn milestone_for(year: i32) -> Option<Milestone> {
    MILESTONES
        .iter()
        .min_by_key(|(y, _, _)| year.abs_diff(*y))
        .map(|&(year, title, kind)| to_milestone(year, title, kind))
}

fn to_milestone(year: i32, title: &str, kind: MilestoneKind) -> Milestone {
    Milestone {
        year,
        title: title.to_owned(),
        kind,
    }
}

/// Result of a single playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor was paused; nothing changed.
    Idle,
    /// The cursor moved forward and keeps playing.
    Moved(i32),
    /// The next step would pass `max_year`: the cursor sits on `max_year`
    /// and playback stopped.
    ReachedEnd(i32),
}

impl Advance {
    /// Whether playback should continue after this tick.
    pub const fn keeps_playing(self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Year cursor bounded by `[min_year, max_year]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCursor {
    current_year: i32,
    is_playing: bool,
    speed: PlaybackSpeed,
    min_year: i32,
    max_year: i32,
    present_year: i32,
}

impl TimeCursor {
    /// Create a paused cursor on the present year at speed 1.
    pub fn new(config: &TimelineConfig) -> Self {
        let (min_year, max_year) = if config.min_year <= config.max_year {
            (config.min_year, config.max_year)
        } else {
            (config.max_year, config.min_year)
        };
        Self {
            current_year: config.present_year.clamp(min_year, max_year),
            is_playing: false,
            speed: PlaybackSpeed::default(),
            min_year,
            max_year,
            present_year: config.present_year,
        }
    }

    /// Year under the cursor.
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Whether playback is running.
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Years advanced per tick.
    pub const fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Lower bound of the cursor.
    pub const fn min_year(&self) -> i32 {
        self.min_year
    }

    /// Upper bound of the cursor.
    pub const fn max_year(&self) -> i32 {
        self.max_year
    }

    /// Move the cursor to `year`, clamped into range. Returns the new year.
    ///
    /// The playing flag is left untouched.
    pub fn seek(&mut self, year: i32) -> i32 {
        self.current_year = year.clamp(self.min_year, self.max_year);
        self.current_year
    }

    /// Seek to the labelled quick-jump year.
    pub fn jump(&mut self, jump: QuickJump) -> i32 {
        self.seek(jump.year())
    }

    /// Seek back to `min_year`.
    pub fn reset(&mut self) -> i32 {
        self.seek(self.min_year)
    }

    /// Start playback.
    pub const fn play(&mut self) {
        self.is_playing = true;
    }

    /// Stop playback.
    pub const fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Flip between playing and paused. Returns the new playing flag.
    pub const fn toggle(&mut self) -> bool {
        self.is_playing = !self.is_playing;
        self.is_playing
    }

    /// Set the playback speed; takes effect on the next tick.
    pub const fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Step to the next speed in the 1 -> 2 -> 5 -> 1 cycle.
    pub const fn cycle_speed(&mut self) -> PlaybackSpeed {
        self.speed = self.speed.next();
        self.speed
    }

    /// Perform one playback tick.
    ///
    /// Playback never wraps: the first step that would pass `max_year`
    /// lands on `max_year` and stops playback.
    pub fn advance(&mut self) -> Advance {
        if !self.is_playing {
            return Advance::Idle;
        }
        let next = self.current_year.saturating_add(i32::from(self.speed.years()));
        if next > self.max_year {
            self.current_year = self.max_year;
            self.is_playing = false;
            Advance::ReachedEnd(self.current_year)
        } else {
            self.current_year = next;
            Advance::Moved(next)
        }
    }

    /// Historical / Live / Predicted framing of the current year.
    pub const fn label(&self) -> TimelineLabel {
        TimelineLabel::for_year(self.current_year, self.present_year)
    }

    /// Milestone closest to the current year.
    pub fn milestone(&self) -> Option<Milestone> {
        milestone_for(self.current_year)
    }

    /// Slider position in percent of the year range.
    pub fn progress_percent(&self) -> u8 {
        let span = i64::from(self.max_year).saturating_sub(i64::from(self.min_year));
        let offset = i64::from(self.current_year).saturating_sub(i64::from(self.min_year));
        let percent = offset
            .saturating_mul(100)
            .checked_div(span)
            .unwrap_or(100)
            .clamp(0, 100);
        u8::try_from(percent).unwrap_or(100)
    }

    /// Read-only view handed to listeners and the dashboard.
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            current_year: self.current_year,
            is_playing: self.is_playing,
            speed: self.speed,
            label: self.label(),
            min_year: self.min_year,
            max_year: self.max_year,
            present_year: self.present_year,
            milestone: self.milestone(),
            progress_percent: self.progress_percent(),
        }
    }
}
