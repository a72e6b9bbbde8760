//! SQLite session store
//!
//! Schema:
//! - instruments: id, name, family
//! - practice_sessions: one row per session record, all optional telemetry
//!   columns nullable
//! - Indexes: (user_id, practice_date) for per-user paging
//!
//! Pages are keyset queries on `(practice_date, id)`. Reads run on the
//! blocking pool; the connection sits behind a mutex, and a snapshot walk
//! holds one read transaction for all of its pages.

use chrono::NaiveDate;
use parking_lot::Mutex;
use practicelog_types::{Instrument, PracticeType, SessionRecord, UserId};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::validation::validate_session;
use crate::error::{CoreError, Result};
use crate::filter::SessionFilter;
use crate::snapshot::{
    PageRequest, SessionPage, SessionSource, Snapshot, SnapshotLimits, SnapshotWalk,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS instruments (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        family TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS practice_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        instrument_id INTEGER NOT NULL REFERENCES instruments(id),
        practice_date TEXT NOT NULL,
        minutes INTEGER NOT NULL,
        intensity INTEGER NOT NULL,
        focus TEXT NOT NULL,
        comment TEXT,
        practice_type INTEGER,
        goal TEXT,
        achieved INTEGER NOT NULL DEFAULT 0,
        mood INTEGER,
        energy INTEGER,
        focus_score INTEGER,
        tempo_start INTEGER,
        tempo_end INTEGER,
        metronome INTEGER NOT NULL DEFAULT 0,
        reps INTEGER,
        errors INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_user_date
        ON practice_sessions(user_id, practice_date);
"#;

const SELECT_SESSIONS: &str = "SELECT s.id, s.user_id, s.instrument_id, i.name, s.practice_date, \
     s.minutes, s.intensity, s.focus, s.comment, s.practice_type, s.goal, s.achieved, \
     s.mood, s.energy, s.focus_score, s.tempo_start, s.tempo_end, s.metronome, s.reps, s.errors \
     FROM practice_sessions s JOIN instruments i ON i.id = s.instrument_id \
     WHERE s.user_id = ?";

/// SQLite-backed record store (thread-safe)
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create or open a store database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(CoreError::database("open database"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(CoreError::database("enable WAL mode"))?;

        info!(path = %path.display(), "Opened practice log database");
        Self::init(conn)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(CoreError::database("open database"))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(CoreError::database("enable foreign keys"))?;
        conn.execute_batch(SCHEMA)
            .map_err(CoreError::database("create schema"))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register or replace an instrument
    pub fn add_instrument(&self, instrument: &Instrument) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO instruments (id, name, family) VALUES (?1, ?2, ?3)",
                params![instrument.id, instrument.name, instrument.family],
            )
            .map_err(CoreError::database("insert instrument"))?;
        Ok(())
    }

    /// Register an instrument under the next free id
    pub fn create_instrument(&self, name: &str, family: &str) -> Result<Instrument> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO instruments (name, family) VALUES (?1, ?2)",
            params![name, family],
        )
        .map_err(CoreError::database("insert instrument"))?;

        Ok(Instrument::new(conn.last_insert_rowid(), name, family))
    }

    pub fn instruments(&self) -> Result<Vec<Instrument>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, family FROM instruments ORDER BY name, id")
            .map_err(CoreError::database("list instruments"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Instrument {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    family: row.get(2)?,
                })
            })
            .map_err(CoreError::database("list instruments"))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(CoreError::database("list instruments"))
    }

    /// Validate and insert sessions in one transaction, returning their ids
    ///
    /// Nothing is written if any record is invalid or names an unknown
    /// instrument.
    pub fn insert_sessions(&self, sessions: &[SessionRecord]) -> Result<Vec<i64>> {
        for s in sessions {
            validate_session(s)?;
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(CoreError::database("begin transaction"))?;

        let mut ids = Vec::with_capacity(sessions.len());
        for s in sessions {
            let known = tx
                .query_row(
                    "SELECT 1 FROM instruments WHERE id = ?1",
                    params![s.instrument_id],
                    |_| Ok(()),
                )
                .optional()
                .map_err(CoreError::database("look up instrument"))?;
            if known.is_none() {
                return Err(CoreError::UnknownInstrument {
                    id: s.instrument_id,
                });
            }

            tx.execute(
                "INSERT INTO practice_sessions (id, user_id, instrument_id, practice_date, minutes, \
                 intensity, focus, comment, practice_type, goal, achieved, mood, energy, focus_score, \
                 tempo_start, tempo_end, metronome, reps, errors) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                params![
                    (s.id != 0).then_some(s.id),
                    s.user_id.as_str(),
                    s.instrument_id,
                    s.practice_date.format(DATE_FORMAT).to_string(),
                    s.minutes,
                    s.intensity,
                    s.focus,
                    s.comment,
                    s.practice_type.map(PracticeType::code),
                    s.goal,
                    s.achieved,
                    s.mood,
                    s.energy,
                    s.focus_score,
                    s.tempo_start,
                    s.tempo_end,
                    s.metronome,
                    s.reps,
                    s.errors,
                ],
            )
            .map_err(CoreError::database("insert session"))?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit().map_err(CoreError::database("commit sessions"))?;
        debug!(count = ids.len(), "Inserted practice sessions");
        Ok(ids)
    }
}

/// Build the filtered page query and its parameters
fn page_query(user: &UserId, filter: &SessionFilter, page: PageRequest) -> (String, Vec<Value>) {
    let mut query = String::from(SELECT_SESSIONS);
    let mut values: Vec<Value> = vec![Value::Text(user.as_str().to_string())];

    if let Some(instrument_id) = filter.instrument_id {
        query.push_str(" AND s.instrument_id = ?");
        values.push(Value::Integer(instrument_id));
    }
    if let Some(from) = filter.from {
        query.push_str(" AND s.practice_date >= ?");
        values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = filter.to {
        query.push_str(" AND s.practice_date <= ?");
        values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
    }
    if let Some(ids) = &filter.session_ids {
        if ids.is_empty() {
            query.push_str(" AND 0 = 1");
        } else {
            let placeholders = vec!["?"; ids.len()].join(", ");
            query.push_str(&format!(" AND s.id IN ({})", placeholders));
            values.extend(ids.iter().map(|&id| Value::Integer(id)));
        }
    }

    if let Some(after) = page.after {
        query.push_str(" AND (s.practice_date, s.id) < (?, ?)");
        values.push(Value::Text(after.practice_date.format(DATE_FORMAT).to_string()));
        values.push(Value::Integer(after.id));
    }

    // One extra row tells whether another page follows
    query.push_str(" ORDER BY s.practice_date DESC, s.id DESC LIMIT ?");
    values.push(Value::Integer(page.limit as i64 + 1));

    (query, values)
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn session_from_row(row: &Row) -> rusqlite::Result<SessionRecord> {
    let date: String = row.get(4)?;
    let practice_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| conversion_error(4, format!("invalid practice date {:?}: {}", date, e)))?;

    let practice_type = match row.get::<_, Option<u8>>(9)? {
        Some(code) => Some(
            PracticeType::from_code(code)
                .ok_or_else(|| conversion_error(9, format!("unknown practice type {}", code)))?,
        ),
        None => None,
    };

    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: UserId::new(row.get::<_, String>(1)?),
        instrument_id: row.get(2)?,
        instrument_name: row.get(3)?,
        practice_date,
        minutes: row.get(5)?,
        intensity: row.get(6)?,
        focus: row.get(7)?,
        comment: row.get(8)?,
        practice_type,
        goal: row.get(10)?,
        achieved: row.get(11)?,
        mood: row.get(12)?,
        energy: row.get(13)?,
        focus_score: row.get(14)?,
        tempo_start: row.get(15)?,
        tempo_end: row.get(16)?,
        metronome: row.get(17)?,
        reps: row.get(18)?,
        errors: row.get(19)?,
    })
}

fn query_page(
    conn: &Connection,
    user: &UserId,
    filter: &SessionFilter,
    page: PageRequest,
) -> Result<SessionPage> {
    let (query, values) = page_query(user, filter, page);
    let mut stmt = conn
        .prepare(&query)
        .map_err(CoreError::database("query sessions"))?;
    let mut sessions = stmt
        .query_map(params_from_iter(values), session_from_row)
        .map_err(CoreError::database("query sessions"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(CoreError::database("read session row"))?;

    let has_more = sessions.len() > page.limit;
    sessions.truncate(page.limit);
    Ok(SessionPage { sessions, has_more })
}

impl SessionSource for SqliteStore {
    async fn fetch_page(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> Result<SessionPage> {
        let conn = Arc::clone(&self.conn);
        let user = user.clone();
        let filter = filter.clone();

        tokio::task::spawn_blocking(move || query_page(&conn.lock(), &user, &filter, page)).await?
    }

    /// Walks every page inside one read transaction
    async fn fetch_snapshot(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        limits: SnapshotLimits,
    ) -> Result<Snapshot> {
        let conn = Arc::clone(&self.conn);
        let user = user.clone();
        let filter = filter.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            let tx = conn
                .transaction()
                .map_err(CoreError::database("begin read transaction"))?;

            let mut walk = SnapshotWalk::new(&user, limits);
            while let Some(request) = walk.next_request() {
                walk.accept(query_page(&tx, &user, &filter, request)?)?;
            }
            let snapshot = walk.finish();

            tx.commit()
                .map_err(CoreError::database("end read transaction"))?;
            Ok(snapshot)
        })
        .await?
    }
}
