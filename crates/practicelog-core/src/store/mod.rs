//! Session record stores
//!
//! Two [`SessionSource`](crate::snapshot::SessionSource) implementations:
//! an in-memory store (tests, embedding) and a SQLite-backed store used by
//! the command line front end.

pub mod memory;
pub mod sqlite;
pub mod validation;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use validation::validate_session;
