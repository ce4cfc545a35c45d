//! Scripted [`LogSource`] used by the session and view tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use botmon_client::{LogQuery, LogSource, Result, SourceError};
use botmon_types::{Cursor, LogLevel, LogPage, LogRecord};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub fn record(ts: &str) -> LogRecord {
    LogRecord::new(ts, LogLevel::Info, format!("msg {ts}"))
}

pub fn page(timestamps: &[&str], cursor: &str) -> LogPage {
    LogPage::new(
        timestamps.iter().map(|ts| record(ts)).collect(),
        Cursor::at(cursor),
    )
}

/// Advance (paused) time in small steps until `condition` holds
pub async fn until<F: Fn() -> bool>(condition: F) {
    for _ in 0..60_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

enum Scripted {
    Ready(Result<LogPage>),
    Delayed(Duration, Result<LogPage>),
    Gated(oneshot::Receiver<()>, Result<LogPage>),
}

/// Answers queries from a queue; an exhausted queue yields empty pages
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Scripted>>,
    clears: Mutex<VecDeque<Result<()>>>,
    queries: Mutex<Vec<LogQuery>>,
    active_incremental: AtomicUsize,
    max_incremental: AtomicUsize,
    completed_incremental: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<LogPage>) {
        self.responses.lock().push_back(Scripted::Ready(response));
    }

    pub fn push_delayed(&self, delay: Duration, response: Result<LogPage>) {
        self.responses
            .lock()
            .push_back(Scripted::Delayed(delay, response));
    }

    /// Response held back until the returned sender fires
    pub fn push_gated(&self, response: Result<LogPage>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().push_back(Scripted::Gated(rx, response));
        tx
    }

    pub fn push_clear(&self, result: Result<()>) {
        self.clears.lock().push_back(result);
    }

    /// Every query received, in call order
    pub fn queries(&self) -> Vec<LogQuery> {
        self.queries.lock().clone()
    }

    /// Highest number of incremental queries outstanding at once
    pub fn max_concurrent(&self) -> usize {
        self.max_incremental.load(Ordering::SeqCst)
    }

    pub fn completed_incremental(&self) -> usize {
        self.completed_incremental.load(Ordering::SeqCst)
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn query_logs(&self, query: &LogQuery) -> Result<LogPage> {
        self.queries.lock().push(query.clone());
        let scripted = self.responses.lock().pop_front();

        let _guard = if query.is_full() {
            None
        } else {
            let active = self.active_incremental.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_incremental.fetch_max(active, Ordering::SeqCst);
            Some(ActiveGuard(&self.active_incremental))
        };

        let result = match scripted {
            None => Ok(LogPage::new(Vec::new(), query.since.clone())),
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Delayed(delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            Some(Scripted::Gated(gate, result)) => {
                if gate.await.is_err() {
                    return Err(SourceError::Network("gate dropped".into()));
                }
                result
            }
        };

        if !query.is_full() {
            self.completed_incremental.fetch_add(1, Ordering::SeqCst);
        }
        result
    }

    async fn clear_logs(&self) -> Result<()> {
        self.clears.lock().pop_front().unwrap_or(Ok(()))
    }
}
