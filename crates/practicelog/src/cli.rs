//! Terminal rendering for practicelog commands
//!
//! Every formatter returns either pretty JSON or a comfy-table rendering.

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use practicelog_core::{Analysis, SnapshotCoverage};
use practicelog_types::{CoachingReport, Instrument, PracticeType, SessionRecord, Summary};
use serde::Serialize;

// ============================================================================
// Table Helpers
// ============================================================================

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Note appended when a snapshot hit the record cap
pub fn coverage_note(coverage: &SnapshotCoverage) -> Option<String> {
    coverage.truncated.then(|| {
        format!(
            "Note: only the {} most recent sessions were analyzed (record cap reached).",
            coverage.sessions
        )
    })
}

// ============================================================================
// Formatters
// ============================================================================

pub fn format_instruments(instruments: &[Instrument], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(instruments).unwrap_or_else(|_| "[]".to_string());
    }

    if instruments.is_empty() {
        return "No instruments registered.".to_string();
    }

    let mut table = new_table(&["ID", "Name", "Family"], no_color);
    for i in instruments {
        table.add_row(Row::from(vec![i.id.to_string(), i.name.clone(), i.family.clone()]));
    }
    table.to_string()
}

/// Session list with ids, usable as input to `summary --ids`
pub fn format_sessions(
    sessions: &[SessionRecord],
    coverage: &SnapshotCoverage,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return to_json(&serde_json::json!({
            "sessions": sessions,
            "coverage": coverage,
        }));
    }

    if sessions.is_empty() {
        return "No practice sessions found.".to_string();
    }

    let mut table = new_table(
        &["ID", "Date", "Instrument", "Min", "Intensity", "Type", "Focus"],
        no_color,
    );
    for s in sessions {
        table.add_row(Row::from(vec![
            s.id.to_string(),
            s.practice_date.format("%Y-%m-%d").to_string(),
            s.instrument_name.clone(),
            s.minutes.to_string(),
            s.intensity.to_string(),
            s.practice_type.map(PracticeType::label).unwrap_or("-").to_string(),
            s.focus.clone(),
        ]));
    }

    let mut out = table.to_string();
    if let Some(note) = coverage_note(coverage) {
        out.push_str("\n\n");
        out.push_str(&note);
    }
    out
}

/// Format a summary (human or JSON)
pub fn format_summary(analysis: &Analysis<Summary>, json: bool, no_color: bool) -> String {
    if json {
        return to_json(analysis);
    }

    let summary = &analysis.result;
    if summary.is_empty() {
        return "No practice sessions found.".to_string();
    }

    let mut lines = vec![];
    lines.push(format!("Total minutes:    {}", summary.total_minutes));
    lines.push(format!("Sessions:         {}", summary.entries_count));
    lines.push(format!("Active days:      {}", summary.distinct_active_days));
    lines.push(format!("Avg per day:      {:.1} min", summary.avg_per_day));
    lines.push(format!(
        "Tempo:            {} sessions, avg delta {} BPM",
        summary.pass_with_tempo,
        fmt_opt(summary.avg_tempo_delta, 2)
    ));
    lines.push(format!("Avg mood:         {}", fmt_opt(summary.avg_mood, 2)));
    lines.push(format!("Avg energy:       {}", fmt_opt(summary.avg_energy, 2)));

    let mut instruments = new_table(&["Instrument", "Minutes"], no_color);
    for (name, minutes) in summary.instruments_by_minutes() {
        instruments.add_row(Row::from(vec![name.to_string(), minutes.to_string()]));
    }

    let mut intensity = new_table(&["Intensity", "Minutes"], no_color);
    for (level, minutes) in &summary.minutes_per_intensity {
        intensity.add_row(Row::from(vec![level.to_string(), minutes.to_string()]));
    }

    let mut types = new_table(&["Practice type", "Minutes"], no_color);
    for (pt, minutes) in summary.practice_types() {
        let label = pt.map(PracticeType::label).unwrap_or("Unknown");
        types.add_row(Row::from(vec![label.to_string(), minutes.to_string()]));
    }

    let mut out = lines.join("\n");
    for table in [instruments, intensity, types] {
        out.push_str("\n\n");
        out.push_str(&table.to_string());
    }
    if let Some(note) = coverage_note(&analysis.coverage) {
        out.push_str("\n\n");
        out.push_str(&note);
    }
    out
}

/// Format a coaching report (human or JSON)
pub fn format_report(analysis: &Analysis<CoachingReport>, json: bool, no_color: bool) -> String {
    if json {
        return to_json(analysis);
    }

    let report = &analysis.result;
    let stats = &report.stats;

    let mut lines = vec![];
    lines.push(format!("Sessions:         {}", stats.total_sessions));
    lines.push(format!("Total minutes:    {}", stats.total_minutes));
    lines.push(format!("Avg minutes:      {:.1}", stats.avg_minutes));
    lines.push(format!("Avg intensity:    {:.2}", stats.avg_intensity));
    lines.push(format!("Goal hit rate:    {:.0}%", stats.goal_hit_rate * 100.0));
    lines.push(format!(
        "Avg tempo delta:  {}",
        fmt_opt(stats.avg_tempo_delta, 2)
    ));
    lines.push(format!("Active days:      {}", stats.days_active));

    lines.push(String::new());
    lines.push("Tips:".to_string());
    for tip in &report.tips {
        lines.push(format!("  - {}", tip));
    }

    let mut out = lines.join("\n");

    if !report.plan.is_empty() {
        let mut table = new_table(
            &["Day", "Focus", "Min", "Intensity", "Metronome", "Tempo", "Notes"],
            no_color,
        );
        for item in &report.plan {
            table.add_row(Row::from(vec![
                item.day.to_string(),
                item.focus.clone(),
                item.minutes.to_string(),
                item.intensity.to_string(),
                if item.metronome { "yes" } else { "no" }.to_string(),
                item.tempo_target
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                item.notes.clone(),
            ]));
        }
        out.push_str("\n\nWeekly plan:\n");
        out.push_str(&table.to_string());
    }

    if let Some(note) = coverage_note(&analysis.coverage) {
        out.push_str("\n\n");
        out.push_str(&note);
    }
    out
}
