//! Analytics entry points over a session source
//!
//! Each call loads one snapshot of the user's sessions, then computes the
//! result synchronously. Nothing is cached between calls.

use practicelog_types::{CoachingReport, Summary, UserId};
use serde::Serialize;
use tracing::info;

use crate::analytics::{analyze, summarize_filtered};
use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filter::SessionFilter;
use crate::snapshot::{SessionSource, SnapshotCoverage, SnapshotLoader};

/// A computed result and the snapshot it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis<T> {
    pub result: T,
    pub coverage: SnapshotCoverage,
}

/// Summary and coaching operations for one session source
#[derive(Debug)]
pub struct PracticeAnalytics<S> {
    source: S,
    loader: SnapshotLoader,
}

impl<S: SessionSource> PracticeAnalytics<S> {
    pub fn new(source: S, config: &AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            loader: SnapshotLoader::new(config.limits())?,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Summarize a user's sessions, optionally restricted by `filter`
    ///
    /// The filter is handed to the source and applied again in-core, so a
    /// source that ignores it still yields a correct summary.
    pub async fn summarize(
        &self,
        user: &UserId,
        filter: Option<&SessionFilter>,
    ) -> Result<Analysis<Summary>> {
        let unrestricted = SessionFilter::all();
        let filter = filter.unwrap_or(&unrestricted);

        let snapshot = self.loader.load(&self.source, user, filter).await?;
        let summary = summarize_filtered(&snapshot.sessions, filter);

        info!(
            user = %user,
            sessions = summary.entries_count,
            total_minutes = summary.total_minutes,
            truncated = snapshot.truncated,
            "Summary computed"
        );

        Ok(Analysis {
            result: summary,
            coverage: snapshot.coverage(),
        })
    }

    /// Coaching statistics, tips and a weekly plan over the full history
    pub async fn analyze(&self, user: &UserId) -> Result<Analysis<CoachingReport>> {
        let snapshot = self
            .loader
            .load(&self.source, user, &SessionFilter::all())
            .await?;
        let report = analyze(&snapshot.sessions);

        info!(
            user = %user,
            sessions = report.stats.total_sessions,
            tips = report.tips.len(),
            plan_items = report.plan.len(),
            truncated = snapshot.truncated,
            "Coaching report computed"
        );

        Ok(Analysis {
            result: report,
            coverage: snapshot.coverage(),
        })
    }
}
