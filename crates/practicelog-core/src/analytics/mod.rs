//! Practice analytics: aggregation, coaching rules and weekly planning
//!
//! Everything in this module is a pure function of a session snapshot.
//! Results are recomputed on every call and never cached or persisted.
//!
//! # Rounding
//! All rounding uses round-half-to-even at the stated number of decimals
//! (`47.25 -> 47.2`, `22.5 -> 22`). Tests pin exact values.

pub mod plan;
pub mod rules;
pub mod summary;


pub use plan::{generate_plan, PlanInputs};
pub use rules::{analyze, evaluate_rules, Rule, RuleContext, RuleId, RULES};
pub use summary::{summarize, summarize_filtered, SummaryAccumulator};

/// Round half-to-even at `decimals` decimal places
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Integer sum with a count, used for order-independent means
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MeanAcc {
    sum: i64,
    count: usize,
}

impl MeanAcc {
    pub(crate) fn push(self, value: i64) -> Self {
        Self {
            sum: self.sum + value,
            count: self.count + 1,
        }
    }

    pub(crate) fn push_opt(self, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.push(v),
            None => self,
        }
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Mean of the pushed values; `None` when nothing was pushed
    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}
