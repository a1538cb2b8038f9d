//! Enumeration types for the Oracle Earth scenario core.
//!
//! Wire names are lowercase (`snake_case`) because the dashboard frontend
//! already speaks in those terms (`"critical"`, `"environment"`, ...).

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Crisis feed
// ---------------------------------------------------------------------------

/// Severity of a crisis event.
///
/// Variants are declared from least to most severe so the derived
/// [`Ord`] can be used for alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Minor incident, informational.
    Low,
    /// Noteworthy incident.
    Medium,
    /// Serious incident with regional consequences.
    High,
    /// Incident requiring immediate attention.
    Critical,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a crisis event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventCategory {
    /// Armed conflict, border tension, military standoff.
    Conflict,
    /// Wildfires, pollution, ecosystem damage.
    Environment,
    /// Terrorist or cyber attacks.
    Terrorism,
    /// Market shocks and economic disruption.
    Economy,
    /// Earthquakes, storms and other natural disasters.
    Natural,
}

impl EventCategory {
    /// Every category in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Conflict,
        Self::Environment,
        Self::Terrorism,
        Self::Economy,
        Self::Natural,
    ];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::Environment => "environment",
            Self::Terrorism => "terrorism",
            Self::Economy => "economy",
            Self::Natural => "natural",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Category of a what-if scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ScenarioCategory {
    /// Conflict resolution scenarios.
    Conflict,
    /// Climate and energy scenarios.
    Environment,
    /// Trade and growth scenarios.
    Economy,
    /// International policy scenarios.
    Policy,
}

/// Lifecycle phase of the scenario simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RunPhase {
    /// No evaluation in flight and no report available.
    Idle,
    /// An evaluation is in flight; new submissions are rejected.
    Running,
    /// The last evaluation finished and its report is available.
    Completed,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// How the dashboard frames the data shown for the cursor year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimelineLabel {
    /// Before the present year.
    Historical,
    /// Exactly the present year.
    Live,
    /// After the present year.
    Predicted,
}

impl TimelineLabel {
    /// Derive the label for `year` relative to `present_year`.
    pub const fn for_year(year: i32, present_year: i32) -> Self {
        if year < present_year {
            Self::Historical
        } else if year == present_year {
            Self::Live
        } else {
            Self::Predicted
        }
    }

    /// Human-readable caption shown under the timeline slider.
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Historical => "Historical Data",
            Self::Live => "Live Data",
            Self::Predicted => "AI Predictions",
        }
    }
}

/// Years advanced per playback tick.
///
/// Serialized as the plain number of years (`1`, `2` or `5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlaybackSpeed {
    /// One year per tick.
    #[default]
    Normal,
    /// Two years per tick.
    Double,
    /// Five years per tick.
    Fast,
}

impl PlaybackSpeed {
    /// Number of years this speed advances per tick.
    pub const fn years(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::Double => 2,
            Self::Fast => 5,
        }
    }

    /// The next speed in the 1 -> 2 -> 5 -> 1 cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::Normal => Self::Double,
            Self::Double => Self::Fast,
            Self::Fast => Self::Normal,
        }
    }
}

impl TryFrom<u8> for PlaybackSpeed {
    type Error = String;

    fn try_from(years: u8) -> Result<Self, Self::Error> {
        match years {
            1 => Ok(Self::Normal),
            2 => Ok(Self::Double),
            5 => Ok(Self::Fast),
            other => Err(format!("playback speed must be 1, 2 or 5 (got {other})")),
        }
    }
}

impl From<PlaybackSpeed> for u8 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.years()
    }
}

/// Kind of a historical or projected milestone on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MilestoneKind {
    /// War or geopolitical rupture.
    Conflict,
    /// Climate or environmental agreement.
    Environment,
    /// Terror attack.
    Terrorism,
    /// Economic crisis.
    Economy,
    /// Worldwide event spanning categories.
    Global,
    /// The present day.
    Current,
    /// Projected target or deadline.
    Future,
}

/// Labelled shortcut years offered next to the timeline controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum QuickJump {
    /// 9/11 (2001).
    SeptemberEleven,
    /// Global financial crisis (2008).
    FinancialCrisis,
    /// Russia-Ukraine war (2022).
    Ukraine,
    /// Climate targets deadline (2030).
    Future,
}

impl QuickJump {
    /// Every quick jump in display order.
    pub const ALL: [Self; 4] = [
        Self::SeptemberEleven,
        Self::FinancialCrisis,
        Self::Ukraine,
        Self::Future,
    ];

    /// Target year of the jump.
    pub const fn year(self) -> i32 {
        match self {
            Self::SeptemberEleven => 2001,
            Self::FinancialCrisis => 2008,
            Self::Ukraine => 2022,
            Self::Future => 2030,
        }
    }

    /// Button label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SeptemberEleven => "9/11 (2001)",
            Self::FinancialCrisis => "Crisis (2008)",
            Self::Ukraine => "Ukraine (2022)",
            Self::Future => "Future (2030)",
        }
    }
}
