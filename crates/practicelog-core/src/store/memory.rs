//! In-memory session store with DashMap + parking_lot::RwLock
//!
//! Sessions are sharded per user in a DashMap; the instrument table is small
//! and read-mostly, so it sits behind a RwLock.

use dashmap::DashMap;
use parking_lot::RwLock;
use practicelog_types::{Instrument, SessionRecord, UserId};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::validation::validate_session;
use crate::error::{CoreError, Result};
use crate::filter::SessionFilter;
use crate::snapshot::{
    PageCursor, PageRequest, SessionPage, SessionSource, Snapshot, SnapshotLimits, SnapshotWalk,
};

/// Thread-safe in-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    instruments: RwLock<BTreeMap<i64, Instrument>>,
    sessions: DashMap<UserId, Vec<SessionRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an instrument
    pub fn add_instrument(&self, instrument: Instrument) {
        self.instruments.write().insert(instrument.id, instrument);
    }

    pub fn instruments(&self) -> Vec<Instrument> {
        self.instruments.read().values().cloned().collect()
    }

    /// Validate and store a session, returning its id
    ///
    /// A zero id is replaced with the next free id. The instrument name is
    /// joined from the instrument table.
    pub fn insert(&self, mut session: SessionRecord) -> Result<i64> {
        validate_session(&session)?;

        session.instrument_name = self
            .instruments
            .read()
            .get(&session.instrument_id)
            .map(|i| i.name.clone())
            .ok_or(CoreError::UnknownInstrument {
                id: session.instrument_id,
            })?;

        if session.id == 0 {
            session.id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        } else {
            self.next_id.fetch_max(session.id, Ordering::Relaxed);
        }

        let id = session.id;
        self.sessions
            .entry(session.user_id.clone())
            .or_default()
            .push(session);
        Ok(id)
    }

    /// Number of sessions stored for a user
    pub fn session_count(&self, user: &UserId) -> usize {
        self.sessions.get(user).map_or(0, |s| s.len())
    }
}

/// One keyset page over a user's sessions
fn page_of(all: &[SessionRecord], filter: &SessionFilter, request: PageRequest) -> SessionPage {
    let mut matching: Vec<&SessionRecord> = all
        .iter()
        .filter(|s| filter.matches(s))
        .filter(|s| request.after.is_none_or(|cursor| PageCursor::of(s) < cursor))
        .collect();
    matching.sort_by_key(|s| Reverse(PageCursor::of(s)));

    let has_more = matching.len() > request.limit;
    let sessions = matching
        .into_iter()
        .take(request.limit)
        .cloned()
        .collect();

    SessionPage { sessions, has_more }
}

impl SessionSource for MemoryStore {
    async fn fetch_page(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> Result<SessionPage> {
        Ok(self
            .sessions
            .get(user)
            .map(|all| page_of(&all, filter, page))
            .unwrap_or_default())
    }

    /// Walks every page under one read guard on the user's shard, so no
    /// insert can land mid-walk
    async fn fetch_snapshot(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        limits: SnapshotLimits,
    ) -> Result<Snapshot> {
        let guard = self.sessions.get(user);
        let all: &[SessionRecord] = match guard.as_deref() {
            Some(sessions) => sessions,
            None => &[],
        };

        let mut walk = SnapshotWalk::new(user, limits);
        while let Some(request) = walk.next_request() {
            walk.accept(page_of(all, filter, request))?;
        }
        Ok(walk.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: i64, user: &str, day: u32) -> SessionRecord {
        let mut s = SessionRecord::new(
            id,
            1,
            NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            25,
            3,
        );
        s.user_id = user.into();
        s
    }

    #[test]
    fn test_insert_requires_known_instrument() {
        let store = MemoryStore::new();
        let err = store.insert(record(1, "alice", 1)).unwrap_err();
        assert!(matches!(err, CoreError::UnknownInstrument { id: 1 }));

        store.add_instrument(Instrument::new(1, "Cello", "Strings"));
        assert_eq!(store.insert(record(1, "alice", 1)).unwrap(), 1);
    }

    #[test]
    fn test_insert_assigns_ids_and_joins_names() {
        let store = MemoryStore::new();
        store.add_instrument(Instrument::new(1, "Cello", "Strings"));

        store.insert(record(5, "alice", 1)).unwrap();
        let id = store.insert(record(0, "alice", 2)).unwrap();
        assert_eq!(id, 6);
        assert_eq!(store.session_count(&"alice".into()), 2);
        assert_eq!(store.session_count(&"bob".into()), 0);
    }

    #[tokio::test]
    async fn test_fetch_page_is_scoped_to_user_and_ordered() {
        let store = MemoryStore::new();
        store.add_instrument(Instrument::new(1, "Cello", "Strings"));
        store.insert(record(1, "alice", 3)).unwrap();
        store.insert(record(2, "alice", 9)).unwrap();
        store.insert(record(3, "bob", 5)).unwrap();
        store.insert(record(4, "alice", 9)).unwrap();

        let page = store
            .fetch_page(&"alice".into(), &SessionFilter::all(), PageRequest::first(10))
            .await
            .unwrap();

        let ids: Vec<i64> = page.sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 2, 1]);
        assert!(!page.has_more);
        assert!(page.sessions.iter().all(|s| s.instrument_name == "Cello"));
    }

    #[tokio::test]
    async fn test_fetch_page_resumes_after_cursor() {
        let store = MemoryStore::new();
        store.add_instrument(Instrument::new(1, "Cello", "Strings"));
        for (id, day) in [(1, 3), (2, 9), (4, 9), (5, 1)] {
            store.insert(record(id, "alice", day)).unwrap();
        }

        let first = store
            .fetch_page(&"alice".into(), &SessionFilter::all(), PageRequest::first(2))
            .await
            .unwrap();
        assert_eq!(first.sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![4, 2]);
        assert!(first.has_more);

        let after = PageCursor::of(&first.sessions[1]);
        let second = store
            .fetch_page(
                &"alice".into(),
                &SessionFilter::all(),
                PageRequest {
                    after: Some(after),
                    limit: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(second.sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 5]);
        assert!(!second.has_more);
    }
}
