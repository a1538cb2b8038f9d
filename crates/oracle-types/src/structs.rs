//! Core data structs shared by the scenario core and the dashboard API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    EventCategory, MilestoneKind, PlaybackSpeed, RunPhase, ScenarioCategory, Severity,
    TimelineLabel,
};
use crate::ids::{EventId, RunId};

/// Named numeric parameters of a scenario (`carbonTax -> 100`, ...).
pub type ParameterSet = BTreeMap<String, Decimal>;

// ---------------------------------------------------------------------------
// Crisis feed
// ---------------------------------------------------------------------------

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// Latitude in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in `[-180, 180]`.
    pub longitude: f64,
}

/// A newsworthy global incident shown in the crisis feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CrisisEvent {
    /// Opaque unique identifier.
    pub id: EventId,
    /// Headline.
    pub title: String,
    /// Free-form place name ("South China Sea").
    pub location: String,
    /// How severe the incident is.
    pub severity: Severity,
    /// What kind of incident it is.
    pub category: EventCategory,
    /// When the event entered the feed.
    pub created_at: DateTime<Utc>,
    /// One-line description.
    pub description: String,
    /// Marker position for the globe, when known.
    pub coordinates: Option<Coordinates>,
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// A labelled year on the timeline ("2008: Global Financial Crisis").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Milestone {
    /// Calendar year.
    pub year: i32,
    /// Short caption.
    pub title: String,
    /// Colour/category hint for the view.
    pub kind: MilestoneKind,
}

/// Read snapshot of the time cursor handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineSnapshot {
    /// Year under the cursor.
    pub current_year: i32,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Years advanced per tick.
    #[ts(type = "1 | 2 | 5")]
    pub speed: PlaybackSpeed,
    /// Historical / Live / Predicted framing of `current_year`.
    pub label: TimelineLabel,
    /// Lower bound of the cursor.
    pub min_year: i32,
    /// Upper bound of the cursor.
    pub max_year: i32,
    /// Year considered "now".
    pub present_year: i32,
    /// Milestone closest to `current_year`.
    pub milestone: Option<Milestone>,
    /// Slider position in percent of the year range.
    pub progress_percent: u8,
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// A named what-if situation from the scenario catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scenario {
    /// Unique catalog key (`climate-action`).
    pub id: String,
    /// Display title.
    pub title: String,
    /// The what-if question.
    pub description: String,
    /// Scenario family.
    pub category: ScenarioCategory,
    /// Emoji icon shown next to the title.
    pub icon: String,
    /// Parameter defaults.
    #[ts(as = "BTreeMap<String, String>")]
    pub base_parameters: ParameterSet,
}

/// Adjustable range of one scenario parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParameterRange {
    /// Catalog default.
    #[ts(as = "String")]
    pub default: Decimal,
    /// Lowest accepted override.
    #[ts(as = "String")]
    pub min: Decimal,
    /// Highest accepted override.
    #[ts(as = "String")]
    pub max: Decimal,
    /// Slider granularity.
    #[ts(as = "String")]
    pub step: Decimal,
}

/// Structured result of evaluating a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OutcomeReport {
    /// Title of the evaluated scenario.
    pub scenario_title: String,
    /// Beneficial effects, most significant first.
    pub positive_outcomes: Vec<String>,
    /// Harmful effects and challenges.
    pub negative_outcomes: Vec<String>,
    /// Effects that are neither clearly good nor bad.
    pub neutral_outcomes: Vec<String>,
    /// Likelihood of the scenario playing out, 0-100.
    pub probability_percent: u8,
    /// Expected time horizon ("10-15 years").
    pub timeframe_label: String,
    /// Global impact on a 0-10 scale.
    #[ts(as = "String")]
    pub global_impact_score: Decimal,
}

/// One completed scenario evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScenarioRun {
    /// Unique run identifier.
    pub id: RunId,
    /// Requested scenario key (may be unknown to the catalog).
    pub scenario_id: String,
    /// Overrides after clamping, as stored.
    #[ts(as = "BTreeMap<String, String>")]
    pub overrides: ParameterSet,
    /// Effective parameters (defaults merged with overrides).
    #[ts(as = "BTreeMap<String, String>")]
    pub parameters: ParameterSet,
    /// The analysis result.
    pub outcome: OutcomeReport,
    /// When the evaluation was submitted.
    pub started_at: DateTime<Utc>,
    /// When the evaluation finished.
    pub completed_at: DateTime<Utc>,
}

/// Read snapshot of the scenario simulator handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulatorSnapshot {
    /// Current lifecycle phase.
    pub phase: RunPhase,
    /// Scenario currently selected in the view.
    pub selected_scenario_id: Option<String>,
    /// Overrides staged for the selected scenario.
    #[ts(as = "BTreeMap<String, String>")]
    pub pending_overrides: ParameterSet,
    /// The most recent completed run.
    pub last_run: Option<ScenarioRun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_report_serializes_decimal_as_string() {
        let report = OutcomeReport {
            scenario_title: String::from("Test"),
            positive_outcomes: vec![String::from("good")],
            negative_outcomes: vec![String::from("bad")],
            neutral_outcomes: Vec::new(),
            probability_percent: 60,
            timeframe_label: String::from("5-10 years"),
            global_impact_score: Decimal::new(50, 1),
        };
        let json = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(json["global_impact_score"], "5.0");
        assert_eq!(json["probability_percent"], 60);
    }

    #[test]
    fn parameters_accept_json_numbers() {
        let parsed: Result<ParameterSet, _> =
            serde_json::from_str(r#"{"carbonTax": 120, "economicImpact": -2.5}"#);
        let params = parsed.unwrap_or_default();
        assert_eq!(params.get("carbonTax"), Some(&Decimal::from(120)));
        assert_eq!(params.get("economicImpact"), Some(&Decimal::new(-25, 1)));
    }
}
