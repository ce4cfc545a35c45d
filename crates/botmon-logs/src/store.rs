use std::collections::VecDeque;
use std::sync::Arc;

use botmon_types::{LogLevel, LogRecord};

/// Default number of records retained by a store
pub const DEFAULT_CAPACITY: usize = 2000;

/// A record held by a [`LogStore`] together with its local sequence number
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRecord {
    /// Strictly increasing per store, never reused
    pub seq: u64,

    /// The record itself (shared, immutable)
    pub record: Arc<LogRecord>,
}

impl std::ops::Deref for StoredRecord {
    type Target = LogRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Counts per log level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub fatal: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error + self.fatal
    }

    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
            LogLevel::Fatal => self.fatal,
        }
    }

    fn slot(&mut self, level: LogLevel) -> &mut usize {
        match level {
            LogLevel::Debug => &mut self.debug,
            LogLevel::Info => &mut self.info,
            LogLevel::Warn => &mut self.warn,
            LogLevel::Error => &mut self.error,
            LogLevel::Fatal => &mut self.fatal,
        }
    }

    fn increment(&mut self, level: LogLevel) {
        *self.slot(level) += 1;
    }

    fn decrement(&mut self, level: LogLevel) {
        let slot = self.slot(level);
        *slot = slot.saturating_sub(1);
    }
}

/// Capacity-bounded, arrival-ordered record buffer with oldest-first eviction.
///
/// The store has a single owner. Readers get an immutable [`snapshot`](Self::snapshot)
/// that reflects the state between two mutations, never a partial one.
#[derive(Debug)]
pub struct LogStore {
    /// Internal storage, oldest at the front
    entries: VecDeque<StoredRecord>,

    /// Maximum number of retained records
    capacity: usize,

    /// Sequence number for the next inserted record
    next_seq: u64,

    /// Incrementally maintained per-level counts
    level_counts: LevelCounts,
}

impl LogStore {
    /// Create an empty store retaining at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
            level_counts: LevelCounts::default(),
        }
    }

    /// Append records in the given order, evicting from the front past capacity.
    ///
    /// Returns the number of evicted records.
    pub fn append<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = LogRecord>,
    {
        let mut evicted = 0;
        for record in records {
            self.push_back(record);
            if self.entries.len() > self.capacity {
                self.pop_front();
                evicted += 1;
            }
        }
        evicted
    }

    /// Reinitialise from a full load, keeping only the newest `capacity` records
    pub fn replace(&mut self, records: Vec<LogRecord>) {
        self.entries.clear();
        self.level_counts = LevelCounts::default();

        let skip = records.len().saturating_sub(self.capacity);
        for record in records.into_iter().skip(skip) {
            self.push_back(record);
        }
    }

    /// Remove every record. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.level_counts = LevelCounts::default();
    }

    /// Immutable ordered view of the current contents
    pub fn snapshot(&self) -> Arc<[StoredRecord]> {
        self.entries.iter().cloned().collect()
    }

    /// Iterate the current contents, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Per-level counts of the retained records
    pub fn level_counts(&self) -> LevelCounts {
        self.level_counts
    }

    fn push_back(&mut self, record: LogRecord) {
        self.level_counts.increment(record.level);
        self.entries.push_back(StoredRecord {
            seq: self.next_seq,
            record: Arc::new(record),
        });
        self.next_seq += 1;
    }

    fn pop_front(&mut self) {
        if let Some(evicted) = self.entries.pop_front() {
            self.level_counts.decrement(evicted.level);
        }
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str) -> LogRecord {
        LogRecord::new(ts, LogLevel::Info, format!("msg {ts}"))
    }

    fn timestamps(store: &LogStore) -> Vec<String> {
        store.iter().map(|r| r.timestamp.clone()).collect()
    }

    #[test]
    fn test_append_evicts_oldest() {
        let mut store = LogStore::new(3);
        assert_eq!(store.append(vec![record("t1"), record("t2")]), 0);
        assert_eq!(store.append(vec![record("t3"), record("t4"), record("t5")]), 2);
        assert_eq!(timestamps(&store), vec!["t3", "t4", "t5"]);
    }

    #[test]
    fn test_replace_keeps_most_recent() {
        let mut store = LogStore::new(3);
        store.append(vec![record("old")]);
        store.replace((1..=5).map(|i| record(&format!("t{i}"))).collect());
        assert_eq!(timestamps(&store), vec!["t3", "t4", "t5"]);
    }

    #[test]
    fn test_capacity_invariant_over_mixed_operations() {
        let capacity = 7;
        let mut store = LogStore::new(capacity);
        let mut expected: Vec<String> = Vec::new();
        let mut next = 0;

        for round in 0..50 {
            let batch: Vec<LogRecord> = (0..(round % 5))
                .map(|_| {
                    next += 1;
                    record(&format!("t{next:04}"))
                })
                .collect();

            if round % 11 == 0 {
                expected = batch.iter().map(|r| r.timestamp.clone()).collect();
                store.replace(batch);
            } else {
                expected.extend(batch.iter().map(|r| r.timestamp.clone()));
                store.append(batch);
            }

            let keep = expected.len().saturating_sub(capacity);
            expected.drain(..keep);

            assert!(store.len() <= capacity);
            assert_eq!(timestamps(&store), expected);
        }
    }

    #[test]
    fn test_sequence_numbers_are_never_reused() {
        let mut store = LogStore::new(2);
        store.append(vec![record("t1"), record("t2"), record("t3")]);
        let seqs: Vec<u64> = store.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);

        store.clear();
        store.append(vec![record("t4")]);
        assert_eq!(store.iter().next().map(|r| r.seq), Some(3));
    }

    #[test]
    fn test_level_counts_follow_eviction() {
        let mut store = LogStore::new(2);
        store.append(vec![
            LogRecord::new("t1", LogLevel::Error, "a"),
            LogRecord::new("t2", LogLevel::Warn, "b"),
            LogRecord::new("t3", LogLevel::Warn, "c"),
        ]);
        let counts = store.level_counts();
        assert_eq!(counts.error, 0);
        assert_eq!(counts.warn, 2);
        assert_eq!(counts.total(), store.len());

        store.clear();
        assert_eq!(store.level_counts().total(), 0);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutation() {
        let mut store = LogStore::new(5);
        store.append(vec![record("t1")]);
        let before = store.snapshot();
        store.append(vec![record("t2")]);
        store.clear();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].timestamp, "t1");
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut store = LogStore::new(0);
        assert_eq!(store.append(vec![record("t1")]), 1);
        store.replace(vec![record("t2")]);
        assert!(store.is_empty());
    }
}
