//! Weekly plan generator
//!
//! Synthesizes 3 practice slots for the coming week (4 when the error-rate
//! rule fired) from the coaching statistics and a few raw-snapshot facts.
//! Slot order is fixed; day labels are handed out afterwards from the
//! Mon/Wed/Fri/Sun rotation in generation order.

use practicelog_types::{CoachingStats, PlanDay, PlanItem, SessionRecord};

use super::round_half_even;

/// Sessions shorter than this on average get an endurance-framed closing slot
const SHORT_SESSION_MINUTES: f64 = 20.0;

/// Floor for error-reduction tempo targets
const MIN_LOOP_TEMPO: u16 = 40;

/// Facts the planner needs from a non-empty snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanInputs {
    pub avg_minutes: f64,
    pub avg_intensity: f64,
    /// Tempo of the most recent session with both tempo endpoints
    pub last_tempo: Option<u16>,
    /// Whether the error-rate rule fired
    pub high_error_rate: bool,
}

impl PlanInputs {
    pub fn new(stats: &CoachingStats, sessions: &[SessionRecord], high_error_rate: bool) -> Self {
        Self {
            avg_minutes: stats.avg_minutes,
            avg_intensity: stats.avg_intensity,
            last_tempo: last_tempo(sessions),
            high_error_rate,
        }
    }

    fn base_minutes(&self) -> u32 {
        round_half_even(self.avg_minutes.max(20.0), 0) as u32
    }

    fn base_intensity(&self) -> u8 {
        round_half_even(self.avg_intensity.clamp(2.0, 4.0), 0) as u8
    }

    fn short_sessions(&self) -> bool {
        self.avg_minutes < SHORT_SESSION_MINUTES
    }
}

/// Latest tempo among sessions with both endpoints
///
/// Most recent practice date wins; same-day ties go to the higher session id
/// so the result does not depend on snapshot order.
fn last_tempo(sessions: &[SessionRecord]) -> Option<u16> {
    sessions
        .iter()
        .filter(|s| s.tempo_pair().is_some())
        .max_by(|a, b| {
            a.practice_date
                .cmp(&b.practice_date)
                .then_with(|| a.id.cmp(&b.id))
        })
        .and_then(SessionRecord::latest_tempo)
}

/// A plan slot before its day is assigned
struct Slot {
    focus: &'static str,
    minutes: u32,
    intensity: u8,
    metronome: bool,
    tempo_target: Option<u16>,
    notes: &'static str,
}

fn technique_slot(inputs: &PlanInputs, base_minutes: u32, base_intensity: u8) -> Slot {
    let notes = if inputs.last_tempo.is_some() {
        "Blocks: 4x(6-8 reps) with +2 BPM between blocks. Back off if errors exceed 20%."
    } else {
        "Work in short loops (6-8 reps) and keep steady timing. Add a metronome going forward."
    };

    Slot {
        focus: "Technique - scales / intonation",
        minutes: base_minutes,
        intensity: (base_intensity + 1).clamp(2, 5),
        metronome: true,
        tempo_target: inputs.last_tempo.map(|t| t.saturating_add(2)),
        notes,
    }
}

fn musicality_slot(base_minutes: u32, base_intensity: u8) -> Slot {
    Slot {
        focus: "Musicality - phrasing / dynamics",
        minutes: base_minutes,
        intensity: base_intensity,
        metronome: false,
        tempo_target: None,
        notes: "Set a measurable goal (e.g. phrase X in one breath with stable intonation). Record and evaluate.",
    }
}

fn error_reduction_slot(inputs: &PlanInputs, base_minutes: u32, base_intensity: u8) -> Slot {
    Slot {
        focus: "Error reduction - loop the hard bars",
        minutes: base_minutes.saturating_sub(5),
        intensity: base_intensity.saturating_sub(1).max(2),
        metronome: true,
        tempo_target: inputs
            .last_tempo
            .map(|t| t.saturating_sub(4).max(MIN_LOOP_TEMPO)),
        notes: "Split into small segments (1-2 bars), 5-7 reps each. Raise the tempo slowly once errors drop below 10%.",
    }
}

fn closing_slot(inputs: &PlanInputs, base_minutes: u32, base_intensity: u8) -> Slot {
    let short = inputs.short_sessions();
    let (focus, minutes, tempo_step, notes) = if short {
        (
            "Endurance - longer quality session",
            base_minutes + 10,
            3,
            "Aim for longer stretches of focus. Plan 2-3 sub-blocks with short breaks.",
        )
    } else {
        (
            "Quality - precision & tone",
            base_minutes,
            1,
            "Polish details in a favourite piece. Listen actively to tone and phrase endings.",
        )
    };

    Slot {
        focus,
        minutes,
        intensity: base_intensity.clamp(2, 4),
        metronome: true,
        tempo_target: inputs.last_tempo.map(|t| t.saturating_add(tempo_step)),
        notes,
    }
}

/// Generate the weekly plan
///
/// Only meaningful for a non-empty snapshot; callers skip it otherwise.
pub fn generate_plan(inputs: &PlanInputs) -> Vec<PlanItem> {
    let base_minutes = inputs.base_minutes();
    let base_intensity = inputs.base_intensity();

    let mut slots = vec![
        technique_slot(inputs, base_minutes, base_intensity),
        musicality_slot(base_minutes, base_intensity),
    ];
    if inputs.high_error_rate {
        slots.push(error_reduction_slot(inputs, base_minutes, base_intensity));
    }
    slots.push(closing_slot(inputs, base_minutes, base_intensity));

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| PlanItem {
            day: PlanDay::nth(i),
            focus: slot.focus.to_string(),
            minutes: slot.minutes,
            intensity: slot.intensity,
            metronome: slot.metronome,
            tempo_target: slot.tempo_target,
            notes: slot.notes.to_string(),
        })
        .collect()
}
