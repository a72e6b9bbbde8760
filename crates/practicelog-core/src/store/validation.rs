//! Domain checks applied before a session record enters a store

use practicelog_types::SessionRecord;
use std::fmt::Display;
use std::ops::RangeInclusive;

use crate::error::{CoreError, Result};

const MINUTES: RangeInclusive<u32> = 1..=600;
const SCORE: RangeInclusive<u8> = 1..=5;
const TEMPO: RangeInclusive<u16> = 20..=400;
const COUNT: RangeInclusive<u16> = 0..=1000;
const MAX_TEXT_CHARS: usize = 200;

fn check<T: PartialOrd + Display>(
    id: i64,
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::invalid_session(
            id,
            field,
            format!(
                "must be within {}..={}, got {}",
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}

fn check_opt<T: PartialOrd + Display + Copy>(
    id: i64,
    field: &'static str,
    value: Option<T>,
    range: &RangeInclusive<T>,
) -> Result<()> {
    value.map_or(Ok(()), |v| check(id, field, v, range))
}

fn check_text(id: i64, field: &'static str, value: &str) -> Result<()> {
    let chars = value.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(CoreError::invalid_session(
            id,
            field,
            format!("must be at most {} characters, got {}", MAX_TEXT_CHARS, chars),
        ));
    }
    Ok(())
}

/// Validate every field domain of a session record
///
/// Returns the first violation found.
pub fn validate_session(s: &SessionRecord) -> Result<()> {
    if s.user_id.is_empty() {
        return Err(CoreError::invalid_session(s.id, "userId", "must not be empty"));
    }

    check(s.id, "minutes", s.minutes, &MINUTES)?;
    check(s.id, "intensity", s.intensity, &SCORE)?;
    check_text(s.id, "focus", &s.focus)?;
    if let Some(goal) = &s.goal {
        check_text(s.id, "goal", goal)?;
    }
    check_opt(s.id, "mood", s.mood, &SCORE)?;
    check_opt(s.id, "energy", s.energy, &SCORE)?;
    check_opt(s.id, "focusScore", s.focus_score, &SCORE)?;
    check_opt(s.id, "tempoStart", s.tempo_start, &TEMPO)?;
    check_opt(s.id, "tempoEnd", s.tempo_end, &TEMPO)?;
    check_opt(s.id, "reps", s.reps, &COUNT)?;
    check_opt(s.id, "errors", s.errors, &COUNT)?;

    Ok(())
}
