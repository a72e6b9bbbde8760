//! Snapshot loading from a session source
//!
//! Every analysis works on one snapshot: the complete set of a user's matching
//! session records, fetched once at the start of the call. Pages are walked
//! with a keyset cursor over `(practice_date, id)` in descending order, so a
//! record written mid-walk can never shift another record onto a second page.
//! Stores that can hold a read view for the whole walk override
//! [`SessionSource::fetch_snapshot`] to do so.
//!
//! An optional record cap stops the walk early; hitting it is never silent,
//! the snapshot is marked truncated and a warning is logged.

use chrono::NaiveDate;
use practicelog_types::{SessionRecord, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::filter::SessionFilter;

/// Position in the `(practice_date, id)` descending order
///
/// Ordering is lexicographic: date first, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageCursor {
    pub practice_date: NaiveDate,
    pub id: i64,
}

impl PageCursor {
    pub fn of(session: &SessionRecord) -> Self {
        Self {
            practice_date: session.practice_date,
            id: session.id,
        }
    }
}

/// Window into a user's matching sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Only sessions strictly after this cursor in the descending order;
    /// `None` starts at the most recent session
    pub after: Option<PageCursor>,
    pub limit: usize,
}

impl PageRequest {
    /// First page of a walk
    pub fn first(limit: usize) -> Self {
        Self { after: None, limit }
    }
}

/// One page of sessions plus whether more follow
#[derive(Debug, Clone, Default)]
pub struct SessionPage {
    pub sessions: Vec<SessionRecord>,
    pub has_more: bool,
}

/// Data source for session snapshots
///
/// `fetch_page` returns sessions matching `filter` ordered by practice date
/// descending, then id descending, starting strictly after `page.after`.
pub trait SessionSource: Send + Sync {
    fn fetch_page(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<SessionPage>> + Send;

    /// Load a whole snapshot
    ///
    /// The default walks [`fetch_page`](Self::fetch_page) until the source
    /// reports no more data.
    fn fetch_snapshot(
        &self,
        user: &UserId,
        filter: &SessionFilter,
        limits: SnapshotLimits,
    ) -> impl Future<Output = Result<Snapshot>> + Send
    where
        Self: Sized,
    {
        walk_pages(self, user, filter, limits)
    }
}

/// Walk `source` page by page into a snapshot
pub async fn walk_pages<S: SessionSource>(
    source: &S,
    user: &UserId,
    filter: &SessionFilter,
    limits: SnapshotLimits,
) -> Result<Snapshot> {
    let mut walk = SnapshotWalk::new(user, limits);
    while let Some(request) = walk.next_request() {
        let page = source.fetch_page(user, filter, request).await?;
        walk.accept(page)?;
    }
    Ok(walk.finish())
}

/// Paging limits for snapshot loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    pub page_size: usize,
    /// Upper bound on loaded records; `None` loads everything
    pub max_records: Option<usize>,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_records: None,
        }
    }
}

/// How much of the user's history a snapshot covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCoverage {
    pub sessions: usize,
    pub pages: usize,
    /// True when the record cap cut the snapshot short
    pub truncated: bool,
}

/// Sessions loaded for one analysis call
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sessions: Vec<SessionRecord>,
    pub pages_fetched: usize,
    pub truncated: bool,
}

impl Snapshot {
    pub fn coverage(&self) -> SnapshotCoverage {
        SnapshotCoverage {
            sessions: self.sessions.len(),
            pages: self.pages_fetched,
            truncated: self.truncated,
        }
    }
}

/// Paging state of one snapshot walk
///
/// Drive it with [`next_request`](Self::next_request) and
/// [`accept`](Self::accept) until no request is left. Every accepted record
/// must sort strictly after the previous one; a source that repeats,
/// reorders or stalls fails the walk with `IncompleteSnapshot`.
#[derive(Debug)]
pub struct SnapshotWalk<'a> {
    user: &'a UserId,
    limits: SnapshotLimits,
    sessions: Vec<SessionRecord>,
    seen: HashSet<i64>,
    cursor: Option<PageCursor>,
    pages: usize,
    /// `Some(truncated)` once the walk is over
    finished: Option<bool>,
}

impl<'a> SnapshotWalk<'a> {
    pub fn new(user: &'a UserId, limits: SnapshotLimits) -> Self {
        Self {
            user,
            limits,
            sessions: Vec::new(),
            seen: HashSet::new(),
            cursor: None,
            pages: 0,
            finished: None,
        }
    }

    /// The next page to fetch, or `None` when the walk is complete
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.finished.is_some() {
            return None;
        }
        let limit = match self.limits.max_records {
            Some(cap) => self.limits.page_size.min(cap - self.sessions.len()),
            None => self.limits.page_size,
        };
        Some(PageRequest {
            after: self.cursor,
            limit,
        })
    }

    fn incomplete(&self, reason: String) -> CoreError {
        CoreError::IncompleteSnapshot {
            fetched: self.sessions.len(),
            reason,
        }
    }

    pub fn accept(&mut self, page: SessionPage) -> Result<()> {
        self.pages += 1;
        debug!(
            user = %self.user,
            after = ?self.cursor,
            received = page.sessions.len(),
            has_more = page.has_more,
            "Fetched session page"
        );

        if page.sessions.is_empty() && page.has_more {
            return Err(self.incomplete(
                "source reported more sessions but returned an empty page".to_string(),
            ));
        }

        for session in page.sessions {
            let key = PageCursor::of(&session);
            if self.cursor.is_some_and(|cursor| key >= cursor) {
                return Err(self.incomplete(format!(
                    "session {} is out of order or repeated",
                    session.id
                )));
            }
            if !self.seen.insert(session.id) {
                return Err(self.incomplete(format!("session {} returned twice", session.id)));
            }
            self.cursor = Some(key);
            self.sessions.push(session);
        }

        if let Some(cap) = self.limits.max_records {
            if self.sessions.len() > cap {
                self.sessions.truncate(cap);
                self.finished = Some(true);
                return Ok(());
            }
            if self.sessions.len() == cap {
                self.finished = Some(page.has_more);
                return Ok(());
            }
        }
        if !page.has_more {
            self.finished = Some(false);
        }
        Ok(())
    }

    pub fn finish(self) -> Snapshot {
        let truncated = self.finished.unwrap_or(false);
        if truncated {
            warn!(
                user = %self.user,
                loaded = self.sessions.len(),
                cap = ?self.limits.max_records,
                "Session snapshot truncated at record cap; statistics cover a partial history"
            );
        }

        Snapshot {
            sessions: self.sessions,
            pages_fetched: self.pages,
            truncated,
        }
    }
}

/// Loads snapshots with validated paging limits
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotLoader {
    limits: SnapshotLimits,
}

impl SnapshotLoader {
    pub fn new(limits: SnapshotLimits) -> Result<Self> {
        if limits.page_size == 0 {
            return Err(CoreError::InvalidConfig {
                message: "page size must be greater than zero".to_string(),
            });
        }
        if limits.max_records == Some(0) {
            return Err(CoreError::InvalidConfig {
                message: "record cap must be greater than zero".to_string(),
            });
        }
        Ok(Self { limits })
    }

    pub fn limits(&self) -> SnapshotLimits {
        self.limits
    }

    /// Load every session of `user` matching `filter`
    ///
    /// Source errors are returned unchanged; there is no retry here.
    pub async fn load<S: SessionSource>(
        &self,
        source: &S,
        user: &UserId,
        filter: &SessionFilter,
    ) -> Result<Snapshot> {
        source.fetch_snapshot(user, filter, self.limits).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use practicelog_types::Instrument;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(offset)
    }

    fn store_with(count: i64) -> (MemoryStore, UserId) {
        let store = MemoryStore::new();
        let user = UserId::new("alice");
        store.add_instrument(Instrument::new(1, "Trumpet", "Brass"));
        for i in 1..=count {
            let mut s = SessionRecord::new(i, 1, day(i as u64), 30, 3);
            s.user_id = user.clone();
            store.insert(s).unwrap();
        }
        (store, user)
    }

    fn limits(page_size: usize, max_records: Option<usize>) -> SnapshotLimits {
        SnapshotLimits {
            page_size,
            max_records,
        }
    }

    #[tokio::test]
    async fn test_load_walks_all_pages() {
        let (store, user) = store_with(23);
        let snapshot = walk_pages(&store, &user, &SessionFilter::all(), limits(5, None))
            .await
            .unwrap();
        assert_eq!(snapshot.sessions.len(), 23);
        assert_eq!(snapshot.pages_fetched, 5);
        assert!(!snapshot.truncated);

        let loader = SnapshotLoader::new(limits(5, None)).unwrap();
        let snapshot = loader.load(&store, &user, &SessionFilter::all()).await.unwrap();
        assert_eq!(snapshot.sessions.len(), 23);
        assert_eq!(snapshot.pages_fetched, 5);
    }

    #[tokio::test]
    async fn test_load_reports_truncation() {
        let (store, user) = store_with(23);
        let loader = SnapshotLoader::new(limits(5, Some(12))).unwrap();

        let snapshot = loader.load(&store, &user, &SessionFilter::all()).await.unwrap();
        assert_eq!(snapshot.sessions.len(), 12);
        assert!(snapshot.truncated);
        assert_eq!(
            snapshot.coverage(),
            SnapshotCoverage {
                sessions: 12,
                pages: 3,
                truncated: true
            }
        );
    }

    #[tokio::test]
    async fn test_cap_equal_to_history_is_not_truncation() {
        let (store, user) = store_with(10);
        let loader = SnapshotLoader::new(limits(5, Some(10))).unwrap();

        let snapshot = loader.load(&store, &user, &SessionFilter::all()).await.unwrap();
        assert_eq!(snapshot.sessions.len(), 10);
        assert!(!snapshot.truncated);
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(SnapshotLoader::new(limits(0, None)).is_err());
        assert!(SnapshotLoader::new(limits(10, Some(0))).is_err());
    }

    /// Writes a newer session right after serving the first page
    struct WritingSource {
        store: MemoryStore,
        written: AtomicBool,
    }

    impl SessionSource for WritingSource {
        async fn fetch_page(
            &self,
            user: &UserId,
            filter: &SessionFilter,
            page: PageRequest,
        ) -> Result<SessionPage> {
            let result = self.store.fetch_page(user, filter, page).await;
            if !self.written.swap(true, Ordering::SeqCst) {
                let mut s = SessionRecord::new(0, 1, day(30), 30, 3);
                s.user_id = user.clone();
                self.store.insert(s)?;
            }
            result
        }
    }

    #[tokio::test]
    async fn test_write_between_pages_does_not_duplicate_records() {
        let (store, user) = store_with(4);
        let source = WritingSource {
            store,
            written: AtomicBool::new(false),
        };

        let snapshot = walk_pages(&source, &user, &SessionFilter::all(), limits(2, None))
            .await
            .unwrap();

        let ids: Vec<i64> = snapshot.sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        let total: u32 = snapshot.sessions.iter().map(|s| s.minutes).sum();
        assert_eq!(total, 120);
        assert_eq!(source.store.session_count(&user), 5);
    }

    struct EmptyButMoreSource;

    impl SessionSource for EmptyButMoreSource {
        async fn fetch_page(
            &self,
            _user: &UserId,
            _filter: &SessionFilter,
            _page: PageRequest,
        ) -> Result<SessionPage> {
            Ok(SessionPage {
                sessions: Vec::new(),
                has_more: true,
            })
        }
    }

    #[tokio::test]
    async fn test_empty_page_claiming_more_is_an_error() {
        let loader = SnapshotLoader::default();
        let err = loader
            .load(&EmptyButMoreSource, &UserId::new("bob"), &SessionFilter::all())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::IncompleteSnapshot { fetched: 0, .. }));
    }

    /// Ignores the cursor and serves the first page forever
    struct StuckSource {
        store: MemoryStore,
    }

    impl SessionSource for StuckSource {
        async fn fetch_page(
            &self,
            user: &UserId,
            filter: &SessionFilter,
            page: PageRequest,
        ) -> Result<SessionPage> {
            self.store
                .fetch_page(user, filter, PageRequest::first(page.limit))
                .await
        }
    }

    #[tokio::test]
    async fn test_page_without_progress_is_an_error() {
        let (store, user) = store_with(6);
        let err = walk_pages(
            &StuckSource { store },
            &user,
            &SessionFilter::all(),
            limits(2, None),
        )
        .await
        .unwrap_err();

        match err {
            CoreError::IncompleteSnapshot { fetched, reason } => {
                assert_eq!(fetched, 2);
                assert!(reason.contains("session 6"));
            }
            other => panic!("expected IncompleteSnapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_walk_rejects_repeated_ids() {
        let user = UserId::new("alice");
        let mut walk = SnapshotWalk::new(&user, limits(10, None));
        let mut older = SessionRecord::new(7, 1, day(1), 30, 3);
        older.user_id = user.clone();
        let mut newer = older.clone();
        newer.practice_date = day(5);

        let err = walk
            .accept(SessionPage {
                sessions: vec![newer, older],
                has_more: false,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::IncompleteSnapshot { fetched: 1, .. }));
    }
}
