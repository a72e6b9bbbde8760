//! End-to-end tests for PracticeAnalytics over both stores

use chrono::NaiveDate;
use practicelog_core::analytics::round_half_even;
use practicelog_core::{
    AnalyticsConfig, CoreError, MemoryStore, PracticeAnalytics, SessionFilter, SqliteStore,
};
use practicelog_types::{Instrument, PlanDay, SessionRecord, UserId};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

/// Three sessions over two days: 30 + 45 + 20 minutes, intensities 2/4/3
fn history(user: &str) -> Vec<SessionRecord> {
    let mut a = SessionRecord::new(0, 1, date(6, 1), 30, 2);
    a.tempo_start = Some(60);
    a.tempo_end = Some(66);
    a.achieved = true;
    a.mood = Some(4);

    let mut b = SessionRecord::new(0, 2, date(6, 1), 45, 4);
    b.metronome = true;
    b.reps = Some(10);
    b.errors = Some(4);

    let mut c = SessionRecord::new(0, 1, date(6, 3), 20, 3);
    c.tempo_start = Some(66);
    c.tempo_end = Some(70);

    let mut sessions = vec![a, b, c];
    for s in &mut sessions {
        s.user_id = user.into();
    }
    sessions
}

fn memory_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_instrument(Instrument::new(1, "Guitar", "Strings"));
    store.add_instrument(Instrument::new(2, "Drums", "Percussion"));
    for s in history("alice").into_iter().chain(history("bob")) {
        store.insert(s).unwrap();
    }
    store
}

#[tokio::test]
async fn test_summary_matches_reference_example() {
    let analytics = PracticeAnalytics::new(memory_store(), &AnalyticsConfig::default()).unwrap();

    let analysis = analytics
        .summarize(&UserId::new("alice"), None)
        .await
        .unwrap();
    let summary = analysis.result;

    assert_eq!(summary.total_minutes, 95);
    assert_eq!(summary.distinct_active_days, 2);
    assert_eq!(summary.entries_count, 3);
    assert_eq!(summary.avg_per_day, 47.5);
    assert_eq!(
        summary.minutes_per_intensity.into_iter().collect::<Vec<_>>(),
        vec![(1, 0), (2, 30), (3, 20), (4, 45), (5, 0)]
    );
    assert_eq!(summary.minutes_per_instrument["Guitar"], 50);
    assert_eq!(summary.minutes_per_instrument["Drums"], 45);
    assert_eq!(summary.pass_with_tempo, 2);
    assert_eq!(summary.avg_tempo_delta, Some(5.0));
    assert_eq!(summary.avg_mood, Some(4.0));
    assert_eq!(summary.avg_energy, None);

    assert_eq!(analysis.coverage.sessions, 3);
    assert!(!analysis.coverage.truncated);
}

#[tokio::test]
async fn test_filtered_summary() {
    let analytics = PracticeAnalytics::new(memory_store(), &AnalyticsConfig::default()).unwrap();
    let user = UserId::new("alice");

    let filter = SessionFilter::all().instrument(1);
    let summary = analytics
        .summarize(&user, Some(&filter))
        .await
        .unwrap()
        .result;
    assert_eq!(summary.total_minutes, 50);
    assert_eq!(summary.distinct_active_days, 2);

    let filter = SessionFilter::all().to_date(date(6, 2));
    let summary = analytics
        .summarize(&user, Some(&filter))
        .await
        .unwrap()
        .result;
    assert_eq!(summary.total_minutes, 75);

    let filter = SessionFilter::all().ids([]);
    let summary = analytics
        .summarize(&user, Some(&filter))
        .await
        .unwrap()
        .result;
    assert!(summary.is_empty());
    assert_eq!(summary.avg_per_day, 0.0);
}

#[tokio::test]
async fn test_unknown_user_gets_empty_results() {
    let analytics = PracticeAnalytics::new(memory_store(), &AnalyticsConfig::default()).unwrap();
    let nobody = UserId::new("carol");

    let summary = analytics.summarize(&nobody, None).await.unwrap().result;
    assert_eq!(summary.total_minutes, 0);

    let report = analytics.analyze(&nobody).await.unwrap().result;
    assert_eq!(report.stats.total_sessions, 0);
    assert_eq!(report.tips.len(), 1);
    assert!(report.plan.is_empty());
}

#[tokio::test]
async fn test_coaching_report_over_sqlite() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .add_instrument(&Instrument::new(1, "Guitar", "Strings"))
        .unwrap();
    store
        .add_instrument(&Instrument::new(2, "Drums", "Percussion"))
        .unwrap();
    store.insert_sessions(&history("alice")).unwrap();

    let config = AnalyticsConfig {
        page_size: 2,
        max_snapshot_records: None,
    };
    let analytics = PracticeAnalytics::new(store, &config).unwrap();
    let analysis = analytics.analyze(&UserId::new("alice")).await.unwrap();
    let report = analysis.result;

    assert_eq!(analysis.coverage.pages, 2);
    assert_eq!(report.stats.total_sessions, 3);
    assert_eq!(report.stats.total_minutes, 95);
    assert_eq!(report.stats.avg_minutes, round_half_even(95.0 / 3.0, 1));
    assert_eq!(report.stats.avg_intensity, 3.0);
    assert_eq!(report.stats.goal_hit_rate, 0.33);
    assert_eq!(report.stats.avg_tempo_delta, Some(5.0));
    assert_eq!(report.stats.days_active, 2);

    // 4 errors over 10 reps is a high error rate, so the plan has a fourth slot
    assert_eq!(report.plan.len(), 4);
    let days: Vec<PlanDay> = report.plan.iter().map(|p| p.day).collect();
    assert_eq!(days, PlanDay::CYCLE.to_vec());
    assert!(!report.tips.is_empty());
}

#[tokio::test]
async fn test_truncation_is_reported() {
    let config = AnalyticsConfig {
        page_size: 1,
        max_snapshot_records: Some(2),
    };
    let analytics = PracticeAnalytics::new(memory_store(), &config).unwrap();

    let analysis = analytics
        .summarize(&UserId::new("alice"), None)
        .await
        .unwrap();
    assert!(analysis.coverage.truncated);
    assert_eq!(analysis.coverage.sessions, 2);
    assert_eq!(analysis.result.entries_count, 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AnalyticsConfig {
        page_size: 0,
        max_snapshot_records: None,
    };
    assert!(matches!(
        PracticeAnalytics::new(MemoryStore::new(), &config),
        Err(CoreError::InvalidConfig { .. })
    ));
}
