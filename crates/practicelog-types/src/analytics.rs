//! Derived analytics types
//!
//! Everything here is computed on demand from a snapshot of session records
//! and is never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::PracticeType;

/// Aggregated statistics over a set of session records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_minutes: u64,
    /// Number of unique practice dates
    pub distinct_active_days: usize,
    pub entries_count: usize,
    /// `total_minutes / distinct_active_days`, one decimal; 0 without data
    pub avg_per_day: f64,
    /// Minutes keyed by instrument name
    pub minutes_per_instrument: BTreeMap<String, u64>,
    /// Minutes keyed by intensity; always holds keys 1..=5
    pub minutes_per_intensity: BTreeMap<u8, u64>,
    /// Minutes keyed by practice type code; only codes that occur
    pub minutes_per_practice_type: BTreeMap<u8, u64>,
    /// Sessions that recorded both tempo endpoints
    pub pass_with_tempo: usize,
    pub avg_tempo_delta: Option<f64>,
    pub avg_mood: Option<f64>,
    pub avg_energy: Option<f64>,
}

impl Summary {
    /// Instrument totals in display order: minutes descending, then name
    pub fn instruments_by_minutes(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self
            .minutes_per_instrument
            .iter()
            .map(|(name, &minutes)| (name.as_str(), minutes))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Practice type totals with resolved catalog entries
    pub fn practice_types(&self) -> Vec<(Option<PracticeType>, u64)> {
        self.minutes_per_practice_type
            .iter()
            .map(|(&code, &minutes)| (PracticeType::from_code(code), minutes))
            .collect()
    }

    /// Check if empty (no sessions summarized)
    pub fn is_empty(&self) -> bool {
        self.entries_count == 0
    }
}

/// Headline numbers of a coaching analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingStats {
    pub total_sessions: usize,
    pub total_minutes: u64,
    /// Mean minutes per session, one decimal
    pub avg_minutes: f64,
    /// Mean intensity per session, two decimals
    pub avg_intensity: f64,
    /// Share of sessions with `achieved = true` (0..1), two decimals
    pub goal_hit_rate: f64,
    pub avg_tempo_delta: Option<f64>,
    pub days_active: usize,
}

/// Day slot of a plan item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanDay {
    Mon,
    Wed,
    Fri,
    Sun,
}

impl PlanDay {
    /// Fixed rotation used for plan items
    pub const CYCLE: [PlanDay; 4] = [PlanDay::Mon, PlanDay::Wed, PlanDay::Fri, PlanDay::Sun];

    /// Day for the `index`-th generated item, wrapping after four
    pub fn nth(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanDay::Mon => "Mon",
            PlanDay::Wed => "Wed",
            PlanDay::Fri => "Fri",
            PlanDay::Sun => "Sun",
        }
    }
}

impl fmt::Display for PlanDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recommended practice slot for the coming week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub day: PlanDay,
    pub focus: String,
    pub minutes: u32,
    pub intensity: u8,
    pub metronome: bool,
    /// Target tempo in BPM, when the history has tempo data
    pub tempo_target: Option<u16>,
    pub notes: String,
}

/// Tips plus a weekly plan derived from a user's history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingReport {
    pub stats: CoachingStats,
    /// Tips in rule order
    pub tips: Vec<String>,
    /// Weekly plan in generation order (empty when there is no history)
    pub plan: Vec<PlanItem>,
}
