//! Session filtering shared by stores and the aggregation engine
//!
//! Criteria compose by intersection: a session must satisfy every criterion
//! that is set. An unset criterion matches everything.

use chrono::NaiveDate;
use practicelog_types::SessionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Instrument / date-range / id-set filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    pub instrument_id: Option<i64>,
    /// Inclusive lower date bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub to: Option<NaiveDate>,
    /// Explicit session ids; `Some(empty)` matches nothing
    pub session_ids: Option<BTreeSet<i64>>,
}

impl SessionFilter {
    /// Filter that matches every session
    pub fn all() -> Self {
        Self::default()
    }

    pub fn instrument(mut self, instrument_id: i64) -> Self {
        self.instrument_id = Some(instrument_id);
        self
    }

    pub fn from_date(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to_date(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.session_ids = Some(ids.into_iter().collect());
        self
    }

    /// True when no criterion is set
    pub fn is_unrestricted(&self) -> bool {
        self.instrument_id.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.session_ids.is_none()
    }

    /// Check whether a session satisfies every set criterion
    pub fn matches(&self, session: &SessionRecord) -> bool {
        self.instrument_id
            .is_none_or(|id| session.instrument_id == id)
            && self.from.is_none_or(|from| session.practice_date >= from)
            && self.to.is_none_or(|to| session.practice_date <= to)
            && self
                .session_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&session.id))
    }
}
