//! Core domain engine for the baby activity tracker.
//!
//! This crate contains the headless mutation/aggregation logic:
//! - Activity store: the ordered event log and its lifecycle operations
//! - Daily statistics cache: per-day aggregates kept consistent with the
//!   log on every mutation, with fallback recomputation
//! - Edit sessions: save/cancel form semantics with typed baselines
//! - Export/import: additive JSON snapshot merge
//!
//! Presentation (rendering, input handling) lives elsewhere and only
//! consumes [`Tracker`]'s operations and read views.

pub mod activity;
pub mod edit;
pub mod export;
pub mod stats;
pub mod store;
pub mod tracker;

pub use activity::{
    Activity, ActivityId, ActivityKind, AuditSnapshot, DiaperKind, FeedingSide, ParseError,
};
pub use edit::{EditBaselines, EditSession};
pub use export::{APP_VERSION, ExportFile, ImportError, parse_export, render_export};
pub use stats::{DailyStats, DayKey, STATS_VERSION, StatsCache, recompute};
pub use store::{
    ActivityChange, ActivityStore, PendingDeletion, Subtype, UNDO_WINDOW_MS,
};
pub use tracker::Tracker;
