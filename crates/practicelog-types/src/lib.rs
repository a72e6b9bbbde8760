//! practicelog-types - Shared data types for practicelog
//!
//! This crate contains pure data structures without heavy dependencies.
//! No tokio, no database driver - just serde-serializable types.
//!
//! Used by:
//! - practicelog-core (analytics, stores)
//! - practicelog (command line front end)

pub mod analytics;
pub mod models;

// Re-export analytics types
pub use analytics::{CoachingReport, CoachingStats, PlanDay, PlanItem, Summary};

// Re-export model types
pub use models::{Instrument, PracticeType, SessionRecord, UserId};
