//! JSON bodies exchanged with the `/api/monitor` endpoint

use serde::Deserialize;
use tracing::debug;

use botmon_types::{Cursor, LogPage, LogRecord};

use crate::error::{Result, SourceError};

/// Body of `GET /api/monitor`
#[derive(Debug, Deserialize)]
pub(crate) struct LogsResponse {
    #[serde(default)]
    logs: Option<Vec<LogRecord>>,

    #[serde(rename = "lastTimestamp")]
    last_timestamp: Option<String>,

    #[serde(default)]
    count: Option<usize>,
}

impl LogsResponse {
    /// Normalise into an oldest-first page with a cursor at the newest record.
    ///
    /// The service returns full loads newest-first and incremental batches
    /// oldest-first. Timestamps only have millisecond resolution, so the order
    /// is taken from the query kind rather than from comparing timestamps.
    /// The cursor is the later of `lastTimestamp` and the newest record.
    pub(crate) fn into_page(self, full: bool) -> Result<LogPage> {
        let Some(last_timestamp) = self.last_timestamp else {
            return Err(SourceError::Protocol(
                "response is missing lastTimestamp".to_string(),
            ));
        };

        let mut records = self.logs.unwrap_or_default();
        if let Some(count) = self.count {
            if count != records.len() {
                debug!(count, received = records.len(), "log count mismatch");
            }
        }

        if full {
            records.reverse();
        }

        let mut next_cursor = Cursor::at(last_timestamp);
        if let Some(newest) = records.last() {
            next_cursor.advance(&Cursor::at(newest.timestamp.clone()));
        }

        if !records.is_empty() && next_cursor.is_absent() {
            return Err(SourceError::Protocol(
                "non-empty page without a cursor".to_string(),
            ));
        }

        Ok(LogPage::new(records, next_cursor))
    }
}

/// Body of `DELETE /api/monitor`
#[derive(Debug, Deserialize)]
pub(crate) struct ClearResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

/// Error body returned alongside non-success statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use botmon_types::LogLevel;
    use serde_json::json;

    fn parse_as(value: serde_json::Value, full: bool) -> Result<LogPage> {
        serde_json::from_value::<LogsResponse>(value)
            .map_err(|e| SourceError::Protocol(e.to_string()))?
            .into_page(full)
    }

    fn parse(value: serde_json::Value) -> Result<LogPage> {
        parse_as(value, false)
    }

    fn messages(page: &LogPage) -> Vec<&str> {
        page.records.iter().map(|r| r.message.as_str()).collect()
    }

    #[test]
    fn test_full_load_is_reversed() {
        let page = parse_as(
            json!({
                "logs": [
                    {"timestamp": "t3", "level": "INFO", "message": "c"},
                    {"timestamp": "t2", "level": "INFO", "message": "b"},
                    {"timestamp": "t1", "level": "WARN", "message": "a"}
                ],
                "lastTimestamp": "t3",
                "count": 3
            }),
            true,
        )
        .unwrap();

        assert_eq!(messages(&page), vec!["a", "b", "c"]);
        assert_eq!(page.records[0].level, LogLevel::Warn);
        assert_eq!(page.next_cursor.as_str(), Some("t3"));
    }

    #[test]
    fn test_full_load_with_equal_timestamps_is_reversed() {
        let ts = "2024-05-01T10:00:00.123+0800";
        let page = parse_as(
            json!({
                "logs": [
                    {"timestamp": ts, "level": "info", "message": "second"},
                    {"timestamp": ts, "level": "info", "message": "first"}
                ],
                "lastTimestamp": ts,
                "count": 2
            }),
            true,
        )
        .unwrap();

        assert_eq!(messages(&page), vec!["first", "second"]);
        assert_eq!(page.next_cursor.as_str(), Some(ts));
    }

    #[test]
    fn test_incremental_batch_keeps_order() {
        let ts = "2024-05-01T10:00:00.123+0800";
        let page = parse(json!({
            "logs": [
                {"timestamp": ts, "level": "info", "message": "first"},
                {"timestamp": ts, "level": "info", "message": "second"}
            ],
            "lastTimestamp": ts,
            "count": 2
        }))
        .unwrap();

        assert_eq!(messages(&page), vec!["first", "second"]);
    }

    #[test]
    fn test_cursor_taken_from_newest_record() {
        let page = parse(json!({
            "logs": [
                {"timestamp": "t4", "level": "info", "message": "d"},
                {"timestamp": "t5", "level": "info", "message": "e"}
            ],
            "lastTimestamp": "t4",
            "count": 2
        }))
        .unwrap();
        assert_eq!(page.next_cursor.as_str(), Some("t5"));
    }

    #[test]
    fn test_empty_page_without_movement() {
        let page = parse(json!({"logs": null, "lastTimestamp": "", "count": 0})).unwrap();
        assert!(page.records.is_empty());
        assert!(page.next_cursor.is_absent());
    }

    #[test]
    fn test_missing_cursor_is_protocol_error() {
        let err = parse(json!({"logs": [], "count": 0})).unwrap_err();
        assert!(matches!(err, SourceError::Protocol(_)));
    }
}
