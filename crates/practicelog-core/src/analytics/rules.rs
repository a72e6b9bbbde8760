//! Heuristic rule engine
//!
//! Coaching tips come from a fixed, ordered table of `(predicate, message)`
//! rules. Each rule is evaluated independently against a [`RuleContext`] and
//! contributes at most one tip; tips keep table order.

use practicelog_types::{CoachingReport, CoachingStats, SessionRecord, Summary};
use std::fmt;

use super::plan::{generate_plan, PlanInputs};
use super::summary::summarize;
use super::{round_half_even, MeanAcc};

/// Tip returned instead of any analysis when there is no history
pub const NO_SESSIONS_TIP: &str =
    "No sessions logged yet. Log a few sessions before running an analysis.";

/// Stable identifier of a coaching rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    LowIntensity,
    ShortSessions,
    LowGoalHitRate,
    SlowTempoProgress,
    HighErrorRate,
    NoMetronome,
    IrregularPractice,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::LowIntensity => "low-intensity",
            RuleId::ShortSessions => "short-sessions",
            RuleId::LowGoalHitRate => "low-goal-hit-rate",
            RuleId::SlowTempoProgress => "slow-tempo-progress",
            RuleId::HighErrorRate => "high-error-rate",
            RuleId::NoMetronome => "no-metronome",
            RuleId::IrregularPractice => "irregular-practice",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may inspect
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub stats: CoachingStats,
    pub summary: &'a Summary,
    /// Sessions that recorded both tempo endpoints
    pub tempo_sessions: usize,
    /// Mean errors per rep over sessions with reps > 0
    pub avg_error_rate: Option<f64>,
    pub any_metronome: bool,
}

impl<'a> RuleContext<'a> {
    pub fn new(summary: &'a Summary, sessions: &[SessionRecord]) -> Self {
        let (rate_sum, rate_count) = sessions
            .iter()
            .filter_map(SessionRecord::error_rate)
            .fold((0.0, 0usize), |(sum, n), rate| (sum + rate, n + 1));
        let avg_error_rate = (rate_count > 0).then(|| rate_sum / rate_count as f64);

        Self {
            stats: coaching_stats(summary, sessions),
            summary,
            tempo_sessions: summary.pass_with_tempo,
            avg_error_rate,
            any_metronome: sessions.iter().any(|s| s.metronome),
        }
    }

    /// The error-rate condition shared by the tip table and the planner
    pub fn high_error_rate(&self) -> bool {
        self.avg_error_rate.is_some_and(|rate| rate > 0.2)
    }
}

/// One entry of the rule table
pub struct Rule {
    pub id: RuleId,
    pub applies: fn(&RuleContext) -> bool,
    pub message: &'static str,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Rule").field("id", &self.id).finish()
    }
}

/// Rule table, evaluated top to bottom
pub static RULES: &[Rule] = &[
    Rule {
        id: RuleId::LowIntensity,
        applies: |ctx| ctx.stats.avg_intensity < 3.0,
        message: "Raise the intensity now and then (aim for 3-4) to keep driving progress.",
    },
    Rule {
        id: RuleId::ShortSessions,
        applies: |ctx| ctx.stats.avg_minutes < 20.0,
        message: "Your sessions are short. Try fewer but longer quality sessions (25+ min).",
    },
    Rule {
        id: RuleId::LowGoalHitRate,
        applies: |ctx| ctx.stats.total_sessions > 0 && ctx.stats.goal_hit_rate < 0.6,
        message: "Goal completion is below 60%. Make goals clearer and more realistic, and follow up next session.",
    },
    Rule {
        id: RuleId::SlowTempoProgress,
        applies: |ctx| ctx.tempo_sessions >= 10 && ctx.stats.avg_tempo_delta.unwrap_or(0.0) < 2.0,
        message: "Tempo is improving slowly. Work in metronome blocks with small steps (e.g. +2 BPM).",
    },
    Rule {
        id: RuleId::HighErrorRate,
        applies: |ctx| ctx.high_error_rate(),
        message: "Errors per rep above 20%. Lower the tempo and work in short loops (5-7 reps).",
    },
    Rule {
        id: RuleId::NoMetronome,
        applies: |ctx| !ctx.any_metronome,
        message: "Practice with a metronome more often for steady timing and tempo gains.",
    },
    Rule {
        id: RuleId::IrregularPractice,
        applies: |ctx| ctx.stats.days_active < ctx.stats.total_sessions.min(5),
        message: "Practice more regularly. Short daily sessions beat longer sporadic ones.",
    },
];

/// Headline statistics for the coaching report
fn coaching_stats(summary: &Summary, sessions: &[SessionRecord]) -> CoachingStats {
    let total = sessions.len();
    if total == 0 {
        return CoachingStats::default();
    }

    let intensity = sessions
        .iter()
        .fold(MeanAcc::default(), |acc, s| acc.push(i64::from(s.intensity)));
    let achieved = sessions.iter().filter(|s| s.achieved).count();

    CoachingStats {
        total_sessions: total,
        total_minutes: summary.total_minutes,
        avg_minutes: round_half_even(summary.total_minutes as f64 / total as f64, 1),
        avg_intensity: round_half_even(intensity.mean().unwrap_or(0.0), 2),
        goal_hit_rate: round_half_even(achieved as f64 / total as f64, 2),
        avg_tempo_delta: summary.avg_tempo_delta,
        days_active: summary.distinct_active_days,
    }
}

/// Evaluate the rule table in order, returning the rules that fired
pub fn evaluate_rules(ctx: &RuleContext) -> Vec<&'static Rule> {
    RULES
        .iter()
        .filter(|rule| {
            let fired = (rule.applies)(ctx);
            if fired {
                tracing::debug!(rule = %rule.id, "Coaching rule fired");
            }
            fired
        })
        .collect()
}

/// Build the full coaching report for a snapshot
///
/// An empty snapshot short-circuits to zeroed statistics, a single advisory
/// tip and no plan.
pub fn analyze(sessions: &[SessionRecord]) -> CoachingReport {
    if sessions.is_empty() {
        return CoachingReport {
            stats: CoachingStats::default(),
            tips: vec![NO_SESSIONS_TIP.to_string()],
            plan: Vec::new(),
        };
    }

    let summary = summarize(sessions);
    let ctx = RuleContext::new(&summary, sessions);
    let fired = evaluate_rules(&ctx);
    let fired_ids: Vec<&str> = fired.iter().map(|r| r.id.as_str()).collect();

    let plan = generate_plan(&PlanInputs::new(
        &ctx.stats,
        sessions,
        ctx.high_error_rate(),
    ));

    tracing::debug!(
        sessions = ctx.stats.total_sessions,
        rules = ?fired_ids,
        plan_items = plan.len(),
        "Coaching analysis complete"
    );

    CoachingReport {
        stats: ctx.stats,
        tips: fired.iter().map(|r| r.message.to_string()).collect(),
        plan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session(id: i64, day: u32, minutes: u32, intensity: u8) -> SessionRecord {
        let mut s = SessionRecord::new(
            id,
            1,
            NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            minutes,
            intensity,
        );
        s.instrument_name = "Trumpet".to_string();
        s
    }

    fn fired_ids(sessions: &[SessionRecord]) -> Vec<RuleId> {
        let summary = summarize(sessions);
        let ctx = RuleContext::new(&summary, sessions);
        evaluate_rules(&ctx).iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_rule_table_order() {
        let ids: Vec<RuleId> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::LowIntensity,
                RuleId::ShortSessions,
                RuleId::LowGoalHitRate,
                RuleId::SlowTempoProgress,
                RuleId::HighErrorRate,
                RuleId::NoMetronome,
                RuleId::IrregularPractice,
            ]
        );
    }

    #[test]
    fn test_healthy_history_fires_nothing() {
        let sessions: Vec<SessionRecord> = (1..=5)
            .map(|i| {
                let mut s = session(i, i as u32, 40, 4);
                s.achieved = true;
                s.metronome = true;
                s
            })
            .collect();

        assert!(fired_ids(&sessions).is_empty());
    }

    #[test]
    fn test_low_intensity_uses_rounded_average() {
        // mean intensity 2.99
        let mut sessions: Vec<SessionRecord> = (1..=100)
            .map(|i| {
                let mut s = session(i, (i % 28 + 1) as u32, 40, 3);
                s.achieved = true;
                s.metronome = true;
                s
            })
            .collect();
        sessions[0].intensity = 2;

        assert_eq!(fired_ids(&sessions), vec![RuleId::LowIntensity]);
    }

    #[test]
    fn test_tempo_rule_needs_ten_tempo_sessions() {
        let build = |count: i64| -> Vec<SessionRecord> {
            (1..=count)
                .map(|i| {
                    let mut s = session(i, i as u32, 40, 4);
                    s.achieved = true;
                    s.metronome = true;
                    s.tempo_start = Some(100);
                    s.tempo_end = Some(101);
                    s
                })
                .collect()
        };

        assert!(!fired_ids(&build(9)).contains(&RuleId::SlowTempoProgress));
        assert!(fired_ids(&build(10)).contains(&RuleId::SlowTempoProgress));
    }

    #[test]
    fn test_error_rate_ignores_sessions_without_reps() {
        let mut a = session(1, 1, 40, 4);
        a.reps = Some(10);
        a.errors = Some(1);
        let mut b = session(2, 2, 40, 4);
        b.errors = Some(50);

        let summary = summarize(&[a.clone(), b.clone()]);
        let ctx = RuleContext::new(&summary, &[a, b]);
        assert_eq!(ctx.avg_error_rate, Some(0.1));
        assert!(!ctx.high_error_rate());
    }

    #[test]
    fn test_irregular_practice_caps_at_five_days() {
        // 6 sessions on 5 distinct days: min(5, 6) = 5, not fewer than 5
        let sessions: Vec<SessionRecord> = [1, 2, 3, 4, 5, 5]
            .iter()
            .enumerate()
            .map(|(i, &day)| session(i as i64 + 1, day, 40, 4))
            .collect();
        assert!(!fired_ids(&sessions).contains(&RuleId::IrregularPractice));

        // 2 sessions on the same day: 1 < min(5, 2)
        let sessions = vec![session(1, 1, 40, 4), session(2, 1, 40, 4)];
        assert!(fired_ids(&sessions).contains(&RuleId::IrregularPractice));
    }
}
