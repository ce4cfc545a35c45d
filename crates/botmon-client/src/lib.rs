//! Monitor endpoint client for botmon
//!
//! This crate defines the [`LogSource`] seam the sync engine talks to and an
//! HTTP implementation against the agent service's `/api/monitor` endpoint.

mod error;
mod http;
mod source;
mod wire;

pub use error::{Result, SourceError};
pub use http::HttpLogSource;
pub use source::{LogQuery, LogSource};

// Re-export types that are used in our public API
pub use botmon_types::{Cursor, ErrorKind, LogLevel, LogPage, LogRecord};
