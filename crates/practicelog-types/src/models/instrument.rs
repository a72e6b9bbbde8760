//! Instrument catalog entries

use serde::{Deserialize, Serialize};

/// An instrument a user practices on (e.g. Trumpet / Brass)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: i64,
    pub name: String,
    /// Instrument family, e.g. "Brass", "Woodwind", "Percussion"
    #[serde(default)]
    pub family: String,
}

impl Instrument {
    pub fn new(id: i64, name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            family: family.into(),
        }
    }
}
