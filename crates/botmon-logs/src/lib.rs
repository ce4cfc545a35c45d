//! Incremental log tail engine for botmon
//!
//! This crate keeps a bounded, arrival-ordered buffer of records in sync with a
//! remote [`LogSource`](botmon_client::LogSource): one full load, then cursor
//! based incremental polls on a fixed timer. On top of the buffer it derives
//! the filtered display sequence and the follow-latest scroll policy.

pub mod engine;
pub mod filter;
pub mod scroll;
pub mod session;
pub mod store;
pub mod view;

#[cfg(test)]
mod testing;

pub use engine::{Completion, Fetch, FetchKind, SyncEngine, SyncPhase};
pub use filter::FilterView;
pub use scroll::{PinThreshold, ScrollController, ScrollDirective};
pub use session::{LogSession, SessionConfig, SessionError, SessionSnapshot};
pub use store::{DEFAULT_CAPACITY, LevelCounts, LogStore, StoredRecord};
pub use view::LogView;

// Re-export types used in our public API
pub use botmon_types::{LogLevel, LogRecord, SyncError};
