//! JSON import of session records
//!
//! Accepts a JSON array of records in the camelCase wire format
//! (`practiceDate` as `YYYY-MM-DD`, `practiceType` as its numeric code).
//! `id`, `userId` and `instrumentName` may be omitted; stores fill them in.

use practicelog_types::{SessionRecord, UserId};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Read a JSON array of session records
pub fn read_sessions_json(path: &Path) -> Result<Vec<SessionRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Assign `user` to every record that does not name one
pub fn assign_user(sessions: &mut [SessionRecord], user: &UserId) {
    for s in sessions.iter_mut().filter(|s| s.user_id.is_empty()) {
        s.user_id = user.clone();
    }
}
