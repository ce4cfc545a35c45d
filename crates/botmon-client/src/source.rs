use async_trait::async_trait;

use botmon_types::{Cursor, LogLevel, LogPage};

use crate::error::Result;

/// Parameters of one log query
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Server-side level filter (None = all levels)
    pub level: Option<LogLevel>,

    /// Only records strictly after this position; absent means a full load
    pub since: Cursor,

    /// Page size hint for full loads
    pub limit: Option<usize>,
}

impl LogQuery {
    /// Query for a full load
    pub fn full(level: Option<LogLevel>, limit: Option<usize>) -> Self {
        Self {
            level,
            since: Cursor::absent(),
            limit,
        }
    }

    /// Query for everything after `since`
    pub fn incremental(level: Option<LogLevel>, since: Cursor) -> Self {
        Self {
            level,
            since,
            limit: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.since.is_absent()
    }
}

/// Remote log service as seen by the sync engine.
///
/// Implementations return pages in arrival order (oldest first). For an
/// incremental query the page holds exactly the records strictly after
/// `query.since` and its cursor never sorts before `query.since`.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch a page of records
    async fn query_logs(&self, query: &LogQuery) -> Result<LogPage>;

    /// Delete every record held by the service
    async fn clear_logs(&self) -> Result<()>;
}
