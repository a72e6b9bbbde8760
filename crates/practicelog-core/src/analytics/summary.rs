//! Aggregation engine
//!
//! Reduces a snapshot of session records into a [`Summary`]. The reduction is
//! a fold over [`SummaryAccumulator`], whose `merge` is associative and
//! commutative, so the input order never affects the result and partial
//! accumulators built over disjoint chunks can be combined.
//!
//! Quirk kept on purpose: minutes per intensity are gap-filled with zeros for
//! every level 1..=5, minutes per practice type are not. Consumers rely on the
//! fixed intensity axis and on the practice-type map only listing codes that
//! were actually used.

use chrono::NaiveDate;
use practicelog_types::{SessionRecord, Summary};
use std::collections::{BTreeMap, BTreeSet};

use super::{round_half_even, MeanAcc};
use crate::filter::SessionFilter;

/// Intensity levels that always appear in `minutes_per_intensity`
const INTENSITY_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

/// Partial aggregate over any subset of a snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryAccumulator {
    total_minutes: u64,
    entries: usize,
    dates: BTreeSet<NaiveDate>,
    per_instrument: BTreeMap<String, u64>,
    per_intensity: BTreeMap<u8, u64>,
    per_practice_type: BTreeMap<u8, u64>,
    tempo_delta: MeanAcc,
    mood: MeanAcc,
    energy: MeanAcc,
}

/// Add `minutes` under `key`, returning the updated map
fn add_minutes<K: Ord>(mut map: BTreeMap<K, u64>, key: K, minutes: u64) -> BTreeMap<K, u64> {
    *map.entry(key).or_insert(0) += minutes;
    map
}

fn merge_minutes<K: Ord>(left: BTreeMap<K, u64>, right: BTreeMap<K, u64>) -> BTreeMap<K, u64> {
    right
        .into_iter()
        .fold(left, |acc, (key, minutes)| add_minutes(acc, key, minutes))
}

impl SummaryAccumulator {
    /// Fold one session into the aggregate
    pub fn absorb(self, session: &SessionRecord) -> Self {
        let minutes = u64::from(session.minutes);

        let mut dates = self.dates;
        dates.insert(session.practice_date);

        let per_practice_type = match session.practice_type {
            Some(pt) => add_minutes(self.per_practice_type, pt.code(), minutes),
            None => self.per_practice_type,
        };

        Self {
            total_minutes: self.total_minutes + minutes,
            entries: self.entries + 1,
            dates,
            per_instrument: add_minutes(
                self.per_instrument,
                session.instrument_name.clone(),
                minutes,
            ),
            per_intensity: add_minutes(self.per_intensity, session.intensity, minutes),
            per_practice_type,
            tempo_delta: self
                .tempo_delta
                .push_opt(session.tempo_delta().map(i64::from)),
            mood: self.mood.push_opt(session.mood.map(i64::from)),
            energy: self.energy.push_opt(session.energy.map(i64::from)),
        }
    }

    /// Combine two partial aggregates built over disjoint sessions
    pub fn merge(self, other: Self) -> Self {
        let mut dates = self.dates;
        dates.extend(other.dates);

        Self {
            total_minutes: self.total_minutes + other.total_minutes,
            entries: self.entries + other.entries,
            dates,
            per_instrument: merge_minutes(self.per_instrument, other.per_instrument),
            per_intensity: merge_minutes(self.per_intensity, other.per_intensity),
            per_practice_type: merge_minutes(self.per_practice_type, other.per_practice_type),
            tempo_delta: self.tempo_delta.merge(other.tempo_delta),
            mood: self.mood.merge(other.mood),
            energy: self.energy.merge(other.energy),
        }
    }

    /// Produce the final summary
    pub fn finish(self) -> Summary {
        let distinct_active_days = self.dates.len();
        let avg_per_day = if distinct_active_days == 0 {
            0.0
        } else {
            round_half_even(
                self.total_minutes as f64 / distinct_active_days as f64,
                1,
            )
        };

        let minutes_per_intensity = INTENSITY_LEVELS.fold(self.per_intensity, |acc, level| {
            add_minutes(acc, level, 0)
        });

        Summary {
            total_minutes: self.total_minutes,
            distinct_active_days,
            entries_count: self.entries,
            avg_per_day,
            minutes_per_instrument: self.per_instrument,
            minutes_per_intensity,
            minutes_per_practice_type: self.per_practice_type,
            pass_with_tempo: self.tempo_delta.count(),
            avg_tempo_delta: self.tempo_delta.mean(),
            avg_mood: self.mood.mean(),
            avg_energy: self.energy.mean(),
        }
    }
}

/// Summarize a snapshot of sessions
///
/// Pure and order-independent. An empty snapshot yields zero totals, a
/// zero-filled intensity axis and absent averages.
pub fn summarize(sessions: &[SessionRecord]) -> Summary {
    sessions
        .iter()
        .fold(SummaryAccumulator::default(), SummaryAccumulator::absorb)
        .finish()
}

/// Summarize only the sessions that satisfy `filter`
pub fn summarize_filtered(sessions: &[SessionRecord], filter: &SessionFilter) -> Summary {
    sessions
        .iter()
        .filter(|s| filter.matches(s))
        .fold(SummaryAccumulator::default(), SummaryAccumulator::absorb)
        .finish()
}
