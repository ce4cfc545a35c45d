use botmon_types::{LogLevel, LogRecord};

use crate::store::StoredRecord;

/// Client-side filter deriving the display sequence from a store snapshot.
///
/// The level is re-checked locally even though the service already filters,
/// so an unfiltered response never leaks other levels into the view. The text
/// filter is a case-insensitive substring match over message, logger and
/// caller and never touches the network.
#[derive(Clone, Debug, Default)]
pub struct FilterView {
    /// Text as typed
    text: String,

    /// Lowercased text used for matching
    needle: String,
}

impl FilterView {
    pub fn new(text: &str) -> Self {
        let mut view = Self::default();
        view.set_text(text);
        view
    }

    /// Replace the text filter. Returns whether it changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        self.needle = text.to_lowercase();
        true
    }

    /// The text filter as typed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check if the text filter is empty (passes everything)
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Check if a record passes both the level and the text filter
    pub fn matches(&self, record: &LogRecord, level: Option<LogLevel>) -> bool {
        if let Some(level) = level {
            if record.level != level {
                return false;
            }
        }

        if self.needle.is_empty() {
            return true;
        }

        contains_folded(&record.message, &self.needle)
            || record
                .source_component
                .as_deref()
                .is_some_and(|s| contains_folded(s, &self.needle))
            || record
                .call_site
                .as_deref()
                .is_some_and(|s| contains_folded(s, &self.needle))
    }

    /// Derive the visible sequence, preserving order
    pub fn apply(&self, records: &[StoredRecord], level: Option<LogLevel>) -> Vec<StoredRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, level))
            .cloned()
            .collect()
    }

    /// Byte ranges of every match in `text` (for highlighting).
    ///
    /// Lowercasing can change a character's UTF-8 length, so matches are found
    /// in the folded text and mapped back through the character that produced
    /// each folded byte. Ranges always fall on char boundaries of `text`.
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        if self.needle.is_empty() {
            return Vec::new();
        }

        let mut folded = String::with_capacity(text.len());
        // Source char span for every byte of `folded`
        let mut source = Vec::with_capacity(text.len());
        for (offset, c) in text.char_indices() {
            let span = (offset, offset + c.len_utf8());
            for lower in c.to_lowercase() {
                folded.push(lower);
                source.resize(folded.len(), span);
            }
        }

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for (start, m) in folded.match_indices(&self.needle) {
            let begin = source[start].0;
            let end = source[start + m.len() - 1].1;
            match ranges.last_mut() {
                Some(last) if begin < last.1 => last.1 = last.1.max(end),
                _ => ranges.push((begin, end)),
            }
        }
        ranges
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn stored(seq: u64, record: LogRecord) -> StoredRecord {
        StoredRecord {
            seq,
            record: Arc::new(record),
        }
    }

    #[test]
    fn test_text_filter_is_case_insensitive() {
        let filter = FilterView::new("TIMEOUT");
        let record = LogRecord::new("t1", LogLevel::Error, "upstream timeout after 10s");
        assert!(filter.matches(&record, None));

        let record = LogRecord::new("t1", LogLevel::Error, "everything is fine");
        assert!(!filter.matches(&record, None));
    }

    #[test]
    fn test_text_filter_checks_logger_and_caller() {
        let record = LogRecord::new("t1", LogLevel::Info, "started")
            .with_source("Scheduler")
            .with_call_site("brain/loop.go:88");

        assert!(FilterView::new("sched").matches(&record, None));
        assert!(FilterView::new("loop.go").matches(&record, None));
        assert!(!FilterView::new("gateway").matches(&record, None));
    }

    #[test]
    fn test_level_reapplied_client_side() {
        let records = vec![
            stored(0, LogRecord::new("t1", LogLevel::Error, "a")),
            stored(1, LogRecord::new("t2", LogLevel::Info, "b")),
            stored(2, LogRecord::new("t3", LogLevel::Error, "c")),
        ];

        let visible = FilterView::default().apply(&records, Some(LogLevel::Error));
        let seqs: Vec<u64> = visible.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 2]);
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let records = vec![
            stored(0, LogRecord::new("t1", LogLevel::Debug, "a")),
            stored(1, LogRecord::new("t2", LogLevel::Fatal, "b")),
        ];
        let filter = FilterView::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records, None).len(), 2);
    }

    #[test]
    fn test_set_text_reports_change() {
        let mut filter = FilterView::default();
        assert!(filter.set_text("err"));
        assert!(!filter.set_text("err"));
        assert_eq!(filter.text(), "err");
    }

    #[test]
    fn test_find_matches() {
        let filter = FilterView::new("error");
        let matches = filter.find_matches("an Error occurred, another ERROR here");
        assert_eq!(matches, vec![(3, 8), (27, 32)]);
    }

    #[test]
    fn test_find_matches_with_length_changing_case() {
        // KELVIN SIGN shrinks and DOTTED CAPITAL I grows when lowercased
        let text = "\u{212A}\u{130}\u{130}ab";
        let matches = FilterView::new("i").find_matches(text);

        assert_eq!(matches, vec![(3, 5), (5, 7)]);
        for (start, end) in matches {
            assert!(text.is_char_boundary(start) && text.is_char_boundary(end));
            assert_eq!(&text[start..end], "\u{130}");
        }

        let matches = FilterView::new("kab").find_matches("\u{212A}AB");
        assert_eq!(matches, vec![(0, 5)]);
    }
}
