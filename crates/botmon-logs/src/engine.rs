//! Fetch/merge protocol state machine.
//!
//! [`SyncEngine`] performs no I/O. Every transition that needs the network
//! hands back a [`Fetch`] ticket; the caller runs the query and reports the
//! outcome through [`SyncEngine::complete`]. Tickets carry the epoch they were
//! issued in, so a response that outlives a reload is recognised and dropped.

use botmon_client::{LogQuery, SourceError};
use botmon_types::{Cursor, ErrorKind, LogLevel, LogPage, SyncError};
use tracing::{debug, warn};

use crate::store::LogStore;

/// Lifecycle of a sync session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    /// Created, nothing requested yet
    Idle,
    /// Full load outstanding
    Loading,
    /// Baseline established, polling incrementally
    Streaming,
    /// Last full load failed; retried on the next tick
    Error,
    /// Terminal
    Closed,
}

impl SyncPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Streaming => "streaming",
            Self::Error => "error",
            Self::Closed => "closed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Full,
    Incremental,
}

/// A query the engine wants executed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetch {
    pub epoch: u64,
    pub kind: FetchKind,
    pub query: LogQuery,
}

/// What a completed fetch did to the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Full load installed as the new baseline
    Replaced { records: usize },
    /// Incremental batch merged
    Appended { records: usize, evicted: usize },
    /// Empty incremental batch (cursor may have moved)
    Unchanged,
    /// Response belonged to an earlier epoch or a closed session
    Dropped,
    /// Request failed; nothing was mutated
    Failed(SyncError),
}

/// Owns the log store and the cursor/epoch/in-flight bookkeeping of one session
#[derive(Debug)]
pub struct SyncEngine {
    store: LogStore,
    level_filter: Option<LogLevel>,
    cursor: Cursor,

    /// Incremented on every full-reload transition and on clear
    epoch: u64,

    /// An incremental poll is outstanding
    in_flight: bool,

    /// A full load for the current epoch is outstanding
    loading: bool,

    phase: SyncPhase,
    last_error: Option<SyncError>,
    full_load_limit: Option<usize>,

    /// Bumped whenever store contents change
    generation: u64,
}

impl SyncEngine {
    pub fn new(capacity: usize, full_load_limit: Option<usize>) -> Self {
        Self {
            store: LogStore::new(capacity),
            level_filter: None,
            cursor: Cursor::absent(),
            epoch: 0,
            in_flight: false,
            loading: false,
            phase: SyncPhase::Idle,
            last_error: None,
            full_load_limit,
            generation: 0,
        }
    }

    /// Start the session with an initial full load
    pub fn open(&mut self, level_filter: Option<LogLevel>) -> Option<Fetch> {
        if self.phase != SyncPhase::Idle {
            return None;
        }
        self.level_filter = level_filter;
        Some(self.begin_full_load())
    }

    /// Change the server-side level filter. Discards the cursor and reloads.
    pub fn set_level_filter(&mut self, level_filter: Option<LogLevel>) -> Option<Fetch> {
        if self.phase == SyncPhase::Closed || self.level_filter == level_filter {
            return None;
        }
        self.level_filter = level_filter;
        Some(self.begin_full_load())
    }

    /// Explicit reload request
    pub fn reload(&mut self) -> Option<Fetch> {
        if self.phase == SyncPhase::Closed {
            return None;
        }
        Some(self.begin_full_load())
    }

    /// Periodic timer tick.
    ///
    /// Retries a failed full load, otherwise issues an incremental poll unless
    /// one is already outstanding or no baseline exists yet.
    pub fn tick(&mut self) -> Option<Fetch> {
        match self.phase {
            SyncPhase::Idle | SyncPhase::Closed | SyncPhase::Loading => return None,
            SyncPhase::Error => {
                if self.loading {
                    return None;
                }
                debug!(epoch = self.epoch + 1, "retrying full load");
                return Some(self.begin_full_load());
            }
            SyncPhase::Streaming => {}
        }

        if self.in_flight {
            debug!(epoch = self.epoch, "poll skipped, request outstanding");
            return None;
        }
        if self.cursor.is_absent() {
            return None;
        }

        self.in_flight = true;
        Some(Fetch {
            epoch: self.epoch,
            kind: FetchKind::Incremental,
            query: LogQuery::incremental(self.level_filter, self.cursor.clone()),
        })
    }

    /// Apply the outcome of a fetch previously handed out by this engine
    pub fn complete(&mut self, fetch: &Fetch, result: Result<LogPage, SourceError>) -> Completion {
        if fetch.kind == FetchKind::Incremental {
            self.in_flight = false;
        }

        if self.phase == SyncPhase::Closed || fetch.epoch != self.epoch {
            debug!(
                fetch_epoch = fetch.epoch,
                epoch = self.epoch,
                "dropping stale response"
            );
            return Completion::Dropped;
        }

        match fetch.kind {
            FetchKind::Full => self.complete_full(result),
            FetchKind::Incremental => self.complete_incremental(result),
        }
    }

    fn complete_full(&mut self, result: Result<LogPage, SourceError>) -> Completion {
        self.loading = false;
        match result {
            Ok(page) => {
                let records = page.records.len();
                self.store.replace(page.records);
                self.cursor.reset();
                self.cursor.advance(&page.next_cursor);
                self.phase = SyncPhase::Streaming;
                self.last_error = None;
                self.generation += 1;
                debug!(epoch = self.epoch, records, cursor = %self.cursor, "full load applied");
                Completion::Replaced { records }
            }
            Err(err) => {
                warn!(epoch = self.epoch, error = %err, "full load failed");
                let err = SyncError::from(err);
                self.phase = SyncPhase::Error;
                self.last_error = Some(err.clone());
                Completion::Failed(err)
            }
        }
    }

    fn complete_incremental(&mut self, result: Result<LogPage, SourceError>) -> Completion {
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(epoch = self.epoch, error = %err, "poll failed");
                let err = SyncError::from(err);
                self.last_error = Some(err.clone());
                return Completion::Failed(err);
            }
        };

        self.last_error = None;
        if page.records.is_empty() {
            // Heartbeat; no movement is fine
            self.cursor.advance(&page.next_cursor);
            return Completion::Unchanged;
        }

        if page.next_cursor.is_absent() {
            let err = SyncError::new(ErrorKind::Protocol, "records returned without a cursor");
            warn!(epoch = self.epoch, "{}", err);
            self.last_error = Some(err.clone());
            return Completion::Failed(err);
        }

        let records = page.records.len();
        let evicted = self.store.append(page.records);
        self.cursor.advance(&page.next_cursor);
        self.generation += 1;
        debug!(records, evicted, cursor = %self.cursor, "poll merged");
        Completion::Appended { records, evicted }
    }

    /// The remote clear succeeded: drop local state and wait for a reload
    pub fn clear_succeeded(&mut self) {
        if self.phase == SyncPhase::Closed {
            return;
        }
        self.store.clear();
        self.cursor.reset();
        self.epoch += 1;
        self.loading = false;
        self.phase = SyncPhase::Streaming;
        self.last_error = None;
        self.generation += 1;
    }

    /// Terminal transition; later completions are dropped
    pub fn close(&mut self) {
        self.phase = SyncPhase::Closed;
        self.loading = false;
    }

    fn begin_full_load(&mut self) -> Fetch {
        self.epoch += 1;
        self.cursor.reset();
        self.loading = true;
        self.phase = SyncPhase::Loading;
        Fetch {
            epoch: self.epoch,
            kind: FetchKind::Full,
            query: LogQuery::full(self.level_filter, self.full_load_limit),
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn level_filter(&self) -> Option<LogLevel> {
        self.level_filter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
