//! practicelog-core - Core library for practicelog
//!
//! Provides session summaries, rule-based coaching, snapshot loading and the
//! in-memory and SQLite session stores.

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod import;
pub mod service;
pub mod snapshot;
pub mod store;

pub use config::AnalyticsConfig;
pub use error::{CoreError, Result};
pub use export::{export_report_to_json, export_sessions_to_csv, export_summary_to_json};
pub use filter::SessionFilter;
pub use service::{Analysis, PracticeAnalytics};
pub use snapshot::{
    walk_pages, PageCursor, PageRequest, SessionPage, SessionSource, Snapshot, SnapshotCoverage,
    SnapshotLimits, SnapshotLoader, SnapshotWalk,
};
pub use store::{MemoryStore, SqliteStore};
