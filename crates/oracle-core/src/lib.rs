//! Time cursor, crisis feed and scenario simulator for Oracle Earth.
//!
//! This crate owns the state-projection layer behind the dashboard: a
//! year cursor that plays forward on a timer, a bounded feed of generated
//! crisis events, and a what-if simulator that turns a scenario plus
//! parameters into an outcome report.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `oracle-config.yaml` into
//!   strongly-typed structs.
//! - [`timeline`] -- [`TimeCursor`] state machine and the milestone catalog.
//! - [`playback`] -- Scheduler-driven playback of the cursor.
//! - [`scheduler`] -- [`Scheduler`] trait with tokio and virtual-time
//!   implementations.
//! - [`feed`] -- Bounded newest-first crisis feed and its filters.
//! - [`generator`] -- [`EventSource`] trait, the synthetic source, and the
//!   timer that fills the feed.
//! - [`catalog`] -- The five what-if scenarios and their outcome tables.
//! - [`analyst`] -- [`ScenarioAnalyst`] trait and [`CatalogAnalyst`].
//! - [`simulator`] -- Evaluation lifecycle with busy rejection.
//!
//! [`TimeCursor`]: timeline::TimeCursor
//! [`Scheduler`]: scheduler::Scheduler
//! [`EventSource`]: generator::EventSource
//! [`ScenarioAnalyst`]: analyst::ScenarioAnalyst
//! [`CatalogAnalyst`]: analyst::CatalogAnalyst

pub mod analyst;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod generator;
pub mod playback;
pub mod scheduler;
pub mod simulator;
pub mod timeline;
