//! Data models for practicelog

pub mod instrument;
pub mod session;

pub use instrument::Instrument;
pub use session::{PracticeType, SessionRecord, UserId};
