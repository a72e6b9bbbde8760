//! Export of summaries, coaching reports and session lists
//!
//! JSON exports mirror the serde wire format; the CSV export is meant for
//! spreadsheets and has one row per session.

use anyhow::{Context, Result};
use practicelog_types::{CoachingReport, SessionRecord, Summary};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    ensure_parent(path)?;

    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Quote a CSV text field, doubling embedded quotes
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export a summary as pretty-printed JSON
///
/// # Errors
/// Returns error if the directory or file cannot be written
pub fn export_summary_to_json(summary: &Summary, path: &Path) -> Result<()> {
    write_json(summary, path, "summary")
}

/// Export a coaching report (stats, tips, plan) as pretty-printed JSON
pub fn export_report_to_json(report: &CoachingReport, path: &Path) -> Result<()> {
    write_json(report, path, "coaching report")
}

/// Export sessions to CSV
///
/// CSV columns: Date, Instrument, Minutes, Intensity, Type, Focus, Goal,
/// Achieved, Tempo Start, Tempo End, Reps, Errors. Rows keep the input
/// order; absent values are left empty.
pub fn export_sessions_to_csv(sessions: &[SessionRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "Id,Date,Instrument,Minutes,Intensity,Type,Focus,Goal,Achieved,Tempo Start,Tempo End,Reps,Errors"
    )
    .context("Failed to write CSV header")?;

    for s in sessions {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            s.id,
            s.practice_date.format("%Y-%m-%d"),
            quoted(&s.instrument_name),
            s.minutes,
            s.intensity,
            quoted(s.practice_type.map(|pt| pt.label()).unwrap_or("")),
            quoted(&s.focus),
            quoted(s.goal.as_deref().unwrap_or("")),
            s.achieved,
            opt(s.tempo_start),
            opt(s.tempo_end),
            opt(s.reps),
            opt(s.errors),
        )
        .with_context(|| format!("Failed to write row for session {}", s.id))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use practicelog_types::PracticeType;
    use tempfile::TempDir;

    fn session() -> SessionRecord {
        let mut s = SessionRecord::new(
            1,
            1,
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            40,
            4,
        );
        s.instrument_name = "Piano".to_string();
        s.focus = "Chopin \"Revolutionary\", bars 1-20".to_string();
        s.practice_type = Some(PracticeType::Repertoire);
        s.tempo_start = Some(80);
        s.tempo_end = Some(88);
        s
    }

    #[test]
    fn test_export_sessions_to_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/sessions.csv");

        export_sessions_to_csv(&[session()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Id,Date,Instrument,Minutes"));
        assert_eq!(
            lines[1],
            "1,2025-04-02,\"Piano\",40,4,\"Repertoire\",\"Chopin \"\"Revolutionary\"\", bars 1-20\",\"\",false,80,88,,"
        );
    }

    #[test]
    fn test_export_report_to_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = crate::analytics::analyze(&[session()]);

        export_report_to_json(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["stats"]["totalSessions"], 1);
        assert!(value["plan"].as_array().unwrap().len() >= 3);
    }

    #[test]
    fn test_export_summary_to_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        let summary = crate::analytics::summarize(&[session()]);

        export_summary_to_json(&summary, &path).unwrap();

        let back: Summary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, summary);
    }
}
