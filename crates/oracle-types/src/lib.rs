//! Shared type definitions for the Oracle Earth scenario core.
//!
//! This crate is the single source of truth for the data model exchanged
//! between the time cursor, the crisis feed, the scenario simulator and
//! the dashboard. Types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for events and scenario runs
//! - [`enums`] -- Severities, categories, timeline labels, playback speeds
//! - [`structs`] -- Events, scenarios, outcome reports and view snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    EventCategory, MilestoneKind, PlaybackSpeed, QuickJump, RunPhase, ScenarioCategory, Severity,
    TimelineLabel,
};
pub use ids::{EventId, RunId};
pub use structs::{
    Coordinates, CrisisEvent, Milestone, OutcomeReport, ParameterRange, ParameterSet, Scenario,
    ScenarioRun, SimulatorSnapshot, TimelineSnapshot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::RunId::export_all();

        // Enums
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::EventCategory::export_all();
        let _ = crate::enums::ScenarioCategory::export_all();
        let _ = crate::enums::RunPhase::export_all();
        let _ = crate::enums::TimelineLabel::export_all();
        let _ = crate::enums::MilestoneKind::export_all();
        let _ = crate::enums::QuickJump::export_all();

        // Structs
        let _ = crate::structs::Coordinates::export_all();
        let _ = crate::structs::CrisisEvent::export_all();
        let _ = crate::structs::Milestone::export_all();
        let _ = crate::structs::TimelineSnapshot::export_all();
        let _ = crate::structs::Scenario::export_all();
        let _ = crate::structs::ParameterRange::export_all();
        let _ = crate::structs::OutcomeReport::export_all();
        let _ = crate::structs::ScenarioRun::export_all();
        let _ = crate::structs::SimulatorSnapshot::export_all();
    }
}
