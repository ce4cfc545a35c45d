//! Task that owns a [`SyncEngine`] and drives it against a [`LogSource`].
//!
//! Presenters talk to the task through a command channel and observe it
//! through a `watch` channel of immutable [`SessionSnapshot`]s. Network calls
//! run on their own tasks and report back tagged with their [`Fetch`] ticket,
//! so commands are handled while a request is outstanding.

use std::sync::Arc;
use std::time::Duration;

use botmon_client::{LogSource, SourceError};
use botmon_types::{LogLevel, LogPage, SyncError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{Completion, Fetch, SyncEngine, SyncPhase};
use crate::store::{DEFAULT_CAPACITY, LevelCounts, StoredRecord};

/// Default interval between incremental polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Shortest poll period a session will run with
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default deadline for a single remote call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables of one sync session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum records retained
    pub capacity: usize,
    /// Poll timer period (at least [`MIN_POLL_INTERVAL`])
    pub poll_interval: Duration,
    /// Deadline per remote call
    pub request_timeout: Duration,
    /// Page size hint for full loads (None = service default)
    pub full_load_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            full_load_limit: None,
        }
    }
}

/// Immutable view of a session at one point in time
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    /// Buffered records, oldest first
    pub records: Arc<[StoredRecord]>,
    /// Changes whenever `records` changes
    pub generation: u64,
    pub epoch: u64,
    pub phase: SyncPhase,
    pub level_filter: Option<LogLevel>,
    /// A full load is outstanding
    pub is_loading: bool,
    pub last_error: Option<SyncError>,
    pub level_counts: LevelCounts,
    /// Incremental polling has a baseline
    pub has_cursor: bool,
}

impl SessionSnapshot {
    fn capture(engine: &SyncEngine) -> Self {
        Self {
            records: engine.store().snapshot(),
            generation: engine.generation(),
            epoch: engine.epoch(),
            phase: engine.phase(),
            level_filter: engine.level_filter(),
            is_loading: engine.is_loading(),
            last_error: engine.last_error().cloned(),
            level_counts: engine.store().level_counts(),
            has_cursor: !engine.cursor().is_absent(),
        }
    }

    /// Same content and status as `other`
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.epoch == other.epoch
            && self.phase == other.phase
            && self.level_filter == other.level_filter
            && self.is_loading == other.is_loading
            && self.last_error == other.last_error
            && self.has_cursor == other.has_cursor
    }
}

/// Errors returned to presenters by session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("log session is closed")]
    Closed,
}

enum SessionCommand {
    SetLevelFilter(Option<LogLevel>),
    Reload,
    Clear(oneshot::Sender<Result<(), SourceError>>),
}

enum Outcome {
    Fetched(Fetch, Result<LogPage, SourceError>),
    Cleared(oneshot::Sender<Result<(), SourceError>>, Result<(), SourceError>),
}

/// Handle to a running log session
pub struct LogSession {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
}

impl LogSession {
    /// Open a session: issue the full load and start the poll timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        source: Arc<dyn LogSource>,
        config: SessionConfig,
        level_filter: Option<LogLevel>,
    ) -> Self {
        let mut engine = SyncEngine::new(config.capacity, config.full_load_limit);
        let initial = engine.open(level_filter);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::capture(&engine));
        let cancel = CancellationToken::new();

        info!(
            level = ?level_filter,
            capacity = config.capacity,
            interval_ms = config.poll_interval.as_millis() as u64,
            "opening log session"
        );

        tokio::spawn(SessionTask {
            engine,
            source,
            config,
            commands: command_rx,
            snapshots: snapshot_tx,
            cancel: cancel.clone(),
        }
        .run(initial));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel,
        }
    }

    /// Change the server-side level filter (forces a full reload)
    pub fn set_level_filter(&self, level_filter: Option<LogLevel>) {
        let _ = self
            .commands
            .send(SessionCommand::SetLevelFilter(level_filter));
    }

    /// Discard the cursor and perform a fresh full load
    pub fn reload(&self) {
        let _ = self.commands.send(SessionCommand::Reload);
    }

    /// Delete every record on the service; local state is cleared only on success
    pub async fn clear_all(&self) -> Result<(), SessionError> {
        self.begin_clear().await
    }

    /// Queue the clear now and return a detached future for its outcome, so a
    /// caller can await it on another task while it keeps using the handle.
    pub fn begin_clear(&self) -> impl Future<Output = Result<(), SessionError>> + Send + 'static {
        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = self.commands.send(SessionCommand::Clear(reply_tx)).is_ok();

        async move {
            if !queued {
                return Err(SessionError::Closed);
            }
            reply_rx.await.map_err(|_| SessionError::Closed)??;
            Ok(())
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Independent receiver of snapshots
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a new snapshot is published. Returns false once the session ended.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }

    /// Stop polling. In-flight results are discarded when they arrive.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionTask {
    engine: SyncEngine,
    source: Arc<dyn LogSource>,
    config: SessionConfig,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
}

impl SessionTask {
    async fn run(mut self, initial: Option<Fetch>) {
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let period = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(fetch) = initial {
            self.dispatch(fetch, &outcome_tx);
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                _ = ticker.tick() => {
                    if let Some(fetch) = self.engine.tick() {
                        self.dispatch(fetch, &outcome_tx);
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command, &outcome_tx),
                        // Every handle dropped
                        None => break,
                    }
                }

                Some(outcome) = outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }
            }

            self.publish();
        }

        self.engine.close();
        self.publish();
        info!("log session closed");
    }

    fn handle_command(
        &mut self,
        command: SessionCommand,
        outcome_tx: &mpsc::UnboundedSender<Outcome>,
    ) {
        match command {
            SessionCommand::SetLevelFilter(level) => {
                if let Some(fetch) = self.engine.set_level_filter(level) {
                    info!(level = ?level, epoch = fetch.epoch, "level filter changed");
                    self.dispatch(fetch, outcome_tx);
                }
            }
            SessionCommand::Reload => {
                if let Some(fetch) = self.engine.reload() {
                    debug!(epoch = fetch.epoch, "reload requested");
                    self.dispatch(fetch, outcome_tx);
                }
            }
            SessionCommand::Clear(reply) => {
                let source = Arc::clone(&self.source);
                let timeout = self.config.request_timeout;
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    let result = with_timeout(timeout, source.clear_logs()).await;
                    let _ = outcome_tx.send(Outcome::Cleared(reply, result));
                });
            }
        }
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Fetched(fetch, result) => match self.engine.complete(&fetch, result) {
                Completion::Dropped => {
                    debug!(epoch = fetch.epoch, kind = ?fetch.kind, "stale response discarded")
                }
                Completion::Failed(err) => {
                    debug!(epoch = fetch.epoch, kind = ?fetch.kind, error = %err, "fetch failed")
                }
                _ => {}
            },
            Outcome::Cleared(reply, result) => {
                match &result {
                    Ok(()) => {
                        self.engine.clear_succeeded();
                        info!(epoch = self.engine.epoch(), "remote logs cleared");
                    }
                    Err(err) => warn!(error = %err, "clearing remote logs failed"),
                }
                // Caller observes the cleared snapshot once the reply lands
                self.publish();
                let _ = reply.send(result);
            }
        }
    }

    fn dispatch(&self, fetch: Fetch, outcome_tx: &mpsc::UnboundedSender<Outcome>) {
        let source = Arc::clone(&self.source);
        let timeout = self.config.request_timeout;
        let outcome_tx = outcome_tx.clone();

        tokio::spawn(async move {
            let result = with_timeout(timeout, source.query_logs(&fetch.query)).await;
            // Receiver is gone once the session closed
            let _ = outcome_tx.send(Outcome::Fetched(fetch, result));
        });
    }

    fn publish(&self) {
        let next = SessionSnapshot::capture(&self.engine);
        self.snapshots.send_if_modified(|current| {
            if current.same_as(&next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, SourceError>
where
    F: std::future::Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedSource, page, until};
    use botmon_types::{Cursor, ErrorKind};

    fn config() -> SessionConfig {
        SessionConfig {
            capacity: 2000,
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(10),
            full_load_limit: None,
        }
    }

    fn timestamps(snapshot: &SessionSnapshot) -> Vec<String> {
        snapshot
            .records
            .iter()
            .map(|r| r.timestamp.clone())
            .collect()
    }

    async fn wait_for<F>(session: &LogSession, predicate: F) -> SessionSnapshot
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let mut rx = session.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for snapshot")
            .expect("session ended");
        snapshot.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_load_then_poll_in_arrival_order() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1", "t2", "t3"], "t3")));
        source.push(Ok(page(&["t4", "t5"], "t5")));

        let session = LogSession::open(source.clone(), config(), None);
        let snapshot = wait_for(&session, |s| s.records.len() == 5).await;

        assert_eq!(timestamps(&snapshot), vec!["t1", "t2", "t3", "t4", "t5"]);
        let queries = source.queries();
        assert!(queries[0].since.is_absent());
        assert_eq!(queries[1].since, Cursor::at("t3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_never_sees_overlapping_polls() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t0"], "t0")));
        for i in 1..=10 {
            let ts = format!("t{i:02}");
            source.push_delayed(Duration::from_millis(350), Ok(page(&[&ts], &ts)));
        }

        let session = LogSession::open(source.clone(), config(), None);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(source.max_concurrent(), 1);
        let polls = source.queries().len() - 1;
        // one poll per ~400ms cycle, far fewer than the 20 ticks elapsed
        assert!((3..=6).contains(&polls), "polls = {polls}");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.records.len(), 1 + source.completed_incremental());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_during_poll_discards_late_response() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1", "t2"], "t2")));
        let release = source.push_gated(Ok(page(&["t3", "t4"], "t4")));
        source.push(Ok(page(&["e1"], "e1")));

        let session = LogSession::open(source.clone(), config(), None);
        until(|| source.queries().len() == 2).await;

        session.set_level_filter(Some(LogLevel::Error));
        let snapshot = wait_for(&session, |s| s.level_filter.is_some() && !s.is_loading).await;
        assert_eq!(timestamps(&snapshot), vec!["e1"]);

        let _ = release.send(());
        tokio::time::sleep(Duration::from_millis(500)).await;

        let snapshot = session.snapshot();
        assert_eq!(timestamps(&snapshot), vec!["e1"]);
        assert_eq!(source.queries()[2].level, Some(LogLevel::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_stops_polling_until_reload() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1", "t2"], "t2")));

        let session = LogSession::open(source.clone(), config(), None);
        wait_for(&session, |s| s.has_cursor).await;

        session.clear_all().await.unwrap();
        let snapshot = session.snapshot();
        assert!(snapshot.records.is_empty());
        assert!(!snapshot.has_cursor);

        // let any poll dispatched before the clear reach the source
        tokio::time::sleep(Duration::from_millis(10)).await;
        let before = source.queries().len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.queries().len(), before);

        source.push(Ok(page(&["t9"], "t9")));
        session.reload();
        let snapshot = wait_for(&session, |s| s.records.len() == 1).await;
        assert_eq!(timestamps(&snapshot), vec!["t9"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_clear_keeps_local_state() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1"], "t1")));
        source.push_clear(Err(SourceError::Rejected("read-only".into())));

        let session = LogSession::open(source.clone(), config(), None);
        wait_for(&session, |s| s.has_cursor).await;

        let err = session.clear_all().await.unwrap_err();
        assert!(matches!(err, SessionError::Source(SourceError::Rejected(_))));
        assert_eq!(session.snapshot().records.len(), 1);
        assert!(session.snapshot().has_cursor);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces_as_network_error() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1"], "t1")));
        for _ in 0..3 {
            source.push_delayed(Duration::from_secs(30), Ok(page(&["t2"], "t2")));
        }

        let config = SessionConfig {
            request_timeout: Duration::from_secs(1),
            ..config()
        };
        let session = LogSession::open(source.clone(), config, None);
        let snapshot = wait_for(&session, |s| s.last_error.is_some()).await;

        assert_eq!(
            snapshot.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::Network)
        );
        assert_eq!(timestamps(&snapshot), vec!["t1"]);
        assert_eq!(snapshot.phase, SyncPhase::Streaming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_network_activity() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1"], "t1")));

        let mut session = LogSession::open(source.clone(), config(), None);
        wait_for(&session, |s| s.has_cursor).await;

        session.close();
        while session.changed().await {}
        assert_eq!(session.snapshot().phase, SyncPhase::Closed);

        let calls = source.queries().len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.queries().len(), calls);
        assert!(session.clear_all().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_is_clamped() {
        let source = ScriptedSource::new();
        source.push(Ok(page(&["t1"], "t1")));
        source.push(Ok(page(&["t2"], "t2")));

        let config = SessionConfig {
            poll_interval: Duration::ZERO,
            ..config()
        };
        let session = LogSession::open(source.clone(), config, None);
        let snapshot = wait_for(&session, |s| s.records.len() == 2).await;

        assert_eq!(timestamps(&snapshot), vec!["t1", "t2"]);
        assert_eq!(source.max_concurrent(), 1);
    }
}
