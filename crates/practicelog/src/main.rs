//! practicelog - music practice summaries and coaching from the command line

mod cli;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use practicelog_core::import::{assign_user, read_sessions_json};
use practicelog_core::{
    export_report_to_json, export_sessions_to_csv, export_summary_to_json, AnalyticsConfig,
    PracticeAnalytics, SessionFilter, SnapshotLoader, SqliteStore,
};
use practicelog_types::UserId;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "practicelog",
    version,
    about = "Music practice log with summaries, coaching tips and weekly plans",
    long_about = "Keeps a log of practice sessions in a local SQLite database and derives\n\
                  summaries, rule-based coaching tips and a weekly practice plan from it.\n\
                  \n\
                  Examples:\n\
                    practicelog instrument add Cello --family Strings\n\
                    practicelog import sessions.json      # Import a JSON array of sessions\n\
                    practicelog sessions list --from 2025-03-01  # Sessions with their ids\n\
                    practicelog summary --ids 12,14       # Summary of chosen sessions\n\
                    practicelog summary --from 2025-01-01 # Summary since a date\n\
                    practicelog coach                     # Tips and weekly plan\n\
                    practicelog export sessions.csv       # Session list for spreadsheets\n\
                  \n\
                  Environment Variables:\n\
                    PRACTICELOG_DB                        # Database path\n\
                    PRACTICELOG_USER                      # User whose log is used\n\
                    PRACTICELOG_PAGE_SIZE                 # Records per snapshot page\n\
                    PRACTICELOG_MAX_RECORDS               # Cap on records per snapshot\n\
                    RUST_LOG                              # Log filter (overrides --verbose)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the practice database (default: <data dir>/practicelog/practicelog.db)
    #[arg(long, global = true, env = "PRACTICELOG_DB")]
    db: Option<PathBuf>,

    /// User whose practice log is read and written
    #[arg(long, global = true, env = "PRACTICELOG_USER", default_value = "local")]
    user: String,

    /// Analytics config file (default: <config dir>/practicelog/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Records per snapshot page
    #[arg(long, global = true, env = "PRACTICELOG_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Cap on records loaded per analysis
    #[arg(long, global = true, env = "PRACTICELOG_MAX_RECORDS")]
    max_records: Option<usize>,

    /// Disable ANSI colors
    #[arg(long, global = true, env = "PRACTICELOG_NO_COLOR")]
    no_color: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Manage instruments
    Instrument {
        #[command(subcommand)]
        action: InstrumentAction,
    },
    /// Import sessions from a JSON file
    Import {
        /// JSON array of session records
        file: PathBuf,
    },
    /// Browse logged sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Summarize practice time
    Summary {
        /// Only this instrument
        #[arg(long)]
        instrument: Option<i64>,
        /// First practice date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last practice date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only these session ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Coaching tips and a weekly plan
    Coach {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export sessions, summary or coaching report to a file
    Export {
        /// Destination file
        output: PathBuf,
        /// What to export
        #[arg(long, value_enum, default_value_t = ExportFormat::SessionsCsv)]
        format: ExportFormat,
    },
}

#[derive(Subcommand)]
enum InstrumentAction {
    /// Register an instrument
    Add {
        name: String,
        /// Instrument family (Strings, Woodwind, ...)
        #[arg(long, default_value = "")]
        family: String,
    },
    /// List registered instruments
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List sessions, newest first
    List {
        /// Only this instrument
        #[arg(long)]
        instrument: Option<i64>,
        /// First practice date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last practice date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    SessionsCsv,
    SummaryJson,
    ReportJson,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = match cli.db {
        Some(path) => path,
        None => dirs::data_dir()
            .map(|d| d.join("practicelog").join("practicelog.db"))
            .context("Could not determine data directory")?,
    };
    let config = load_config(cli.config.as_deref())?.with_overrides(cli.page_size, cli.max_records);
    config.validate().context("Invalid analytics settings")?;

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let user = UserId::new(cli.user);
    let no_color = cli.no_color;

    match cli.command {
        Command::Instrument { action } => run_instrument(&store, action, no_color)?,
        Command::Import { file } => run_import(&store, &user, &file)?,
        Command::Sessions { action } => {
            run_sessions(&store, &config, &user, action, no_color).await?;
        }
        Command::Summary {
            instrument,
            from,
            to,
            ids,
            json,
        } => {
            let filter = build_filter(instrument, from, to, ids);
            let analytics = PracticeAnalytics::new(store, &config)?;
            let analysis = analytics
                .summarize(&user, Some(&filter))
                .await
                .context("Failed to summarize sessions")?;
            println!("{}", cli::format_summary(&analysis, json, no_color));
        }
        Command::Coach { json } => {
            let analytics = PracticeAnalytics::new(store, &config)?;
            let analysis = analytics
                .analyze(&user)
                .await
                .context("Failed to build coaching report")?;
            println!("{}", cli::format_report(&analysis, json, no_color));
        }
        Command::Export { output, format } => {
            run_export(store, &config, &user, &output, format).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => dir.join("practicelog").join("config.json"),
            None => return Ok(AnalyticsConfig::default()),
        },
    };

    AnalyticsConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))
}

fn build_filter(
    instrument: Option<i64>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    ids: Vec<i64>,
) -> SessionFilter {
    let mut filter = SessionFilter::all();
    if let Some(id) = instrument {
        filter = filter.instrument(id);
    }
    if let Some(from) = from {
        filter = filter.from_date(from);
    }
    if let Some(to) = to {
        filter = filter.to_date(to);
    }
    if !ids.is_empty() {
        filter = filter.ids(ids);
    }
    filter
}

fn run_instrument(store: &SqliteStore, action: InstrumentAction, no_color: bool) -> Result<()> {
    match action {
        InstrumentAction::Add { name, family } => {
            let instrument = store
                .create_instrument(&name, &family)
                .context("Failed to add instrument")?;
            println!("Added instrument {} ({})", instrument.name, instrument.id);
        }
        InstrumentAction::List { json } => {
            let instruments = store.instruments().context("Failed to list instruments")?;
            println!("{}", cli::format_instruments(&instruments, json, no_color));
        }
    }
    Ok(())
}

fn run_import(store: &SqliteStore, user: &UserId, file: &Path) -> Result<()> {
    let mut sessions = read_sessions_json(file)?;
    assign_user(&mut sessions, user);

    let ids = store
        .insert_sessions(&sessions)
        .context("Import aborted, no sessions were written")?;

    info!(count = ids.len(), file = %file.display(), "Imported sessions");
    match (ids.first(), ids.last()) {
        (Some(first), Some(last)) if first != last => {
            println!("Imported {} sessions (ids {}..={})", ids.len(), first, last)
        }
        (Some(id), _) => println!("Imported 1 session (id {})", id),
        _ => println!("Imported 0 sessions"),
    }
    Ok(())
}

async fn run_sessions(
    store: &SqliteStore,
    config: &AnalyticsConfig,
    user: &UserId,
    action: SessionsAction,
    no_color: bool,
) -> Result<()> {
    match action {
        SessionsAction::List {
            instrument,
            from,
            to,
            json,
        } => {
            let filter = build_filter(instrument, from, to, Vec::new());
            let snapshot = SnapshotLoader::new(config.limits())?
                .load(store, user, &filter)
                .await
                .context("Failed to load sessions")?;
            println!(
                "{}",
                cli::format_sessions(&snapshot.sessions, &snapshot.coverage(), json, no_color)
            );
        }
    }
    Ok(())
}

async fn run_export(
    store: SqliteStore,
    config: &AnalyticsConfig,
    user: &UserId,
    output: &Path,
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::SessionsCsv => {
            let loader = SnapshotLoader::new(config.limits())?;
            let snapshot = loader
                .load(&store, user, &SessionFilter::all())
                .await
                .context("Failed to load sessions")?;
            export_sessions_to_csv(&snapshot.sessions, output)?;
            println!(
                "Exported {} sessions to {}",
                snapshot.sessions.len(),
                output.display()
            );
            if let Some(note) = cli::coverage_note(&snapshot.coverage()) {
                eprintln!("{}", note);
            }
        }
        ExportFormat::SummaryJson => {
            let analytics = PracticeAnalytics::new(store, config)?;
            let analysis = analytics.summarize(user, None).await?;
            export_summary_to_json(&analysis.result, output)?;
            println!("Exported summary to {}", output.display());
        }
        ExportFormat::ReportJson => {
            let analytics = PracticeAnalytics::new(store, config)?;
            let analysis = analytics.analyze(user).await?;
            export_report_to_json(&analysis.result, output)?;
            println!("Exported coaching report to {}", output.display());
        }
    }
    Ok(())
}
