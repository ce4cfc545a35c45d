//! Shared types for botmon
//!
//! This crate contains data structures used across multiple botmon crates:
//! the log record as delivered by the monitor endpoint, the synchronization
//! cursor, and the error classification surfaced to presenters.

use std::collections::BTreeMap;
use std::fmt;

use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// All levels, lowest severity first
    pub const ALL: [LogLevel; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Parse a level from common spellings, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "dbg" | "debg" | "trace" => Some(Self::Debug),
            "info" | "inf" | "information" => Some(Self::Info),
            "warn" | "warning" | "wrn" => Some(Self::Warn),
            "error" | "err" | "erro" => Some(Self::Error),
            "fatal" | "panic" | "dpanic" | "critical" | "crit" | "ftl" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Lowercase name, as used in query strings
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
        }
    }

    /// Single-glyph marker shown before the level badge
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Debug => "○",
            Self::Info => "●",
            Self::Warn => "⚠",
            Self::Error => "✗",
            Self::Fatal => "☠",
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Fatal => Color::Magenta,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// A level string that matched none of the known spellings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown log level '{}' (expected debug, info, warn, error or fatal)",
            self.0
        )
    }
}

impl std::error::Error for UnknownLevel {}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_query())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    /// Unrecognised level strings fall back to info instead of failing the page
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

/// A single log record as emitted by the service. Immutable once received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Ordered timestamp token (ISO-8601, lexically comparable)
    pub timestamp: String,

    /// Severity
    pub level: LogLevel,

    /// Log message
    #[serde(default)]
    pub message: String,

    /// Emitting logger/component name
    #[serde(
        rename = "logger",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub source_component: Option<String>,

    /// Call site (`file.go:123`)
    #[serde(
        rename = "caller",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub call_site: Option<String>,

    /// Structured fields that are not part of the fixed schema
    #[serde(
        rename = "extra",
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Create a record with no optional fields
    pub fn new(timestamp: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            message: message.into(),
            source_component: None,
            call_site: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_component = Some(source.into());
        self
    }

    pub fn with_call_site(mut self, call_site: impl Into<String>) -> Self {
        self.call_site = Some(call_site.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Attributes rendered as `key=value` pairs, values JSON-encoded
    pub fn attributes_inline(&self) -> String {
        self.attributes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, serde_json::Value>, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Synchronization Types
// ============================================================================

/// Opaque "last record observed" token. Absent until the first successful sync.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cursor(Option<String>);

impl Cursor {
    pub fn absent() -> Self {
        Self(None)
    }

    /// Cursor at the given token; an empty token is treated as absent
    pub fn at(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Move forward to `next` if it lies later than the current position.
    ///
    /// Returns whether the cursor moved. An absent `next` or one that sorts
    /// before the current token leaves the cursor where it is.
    pub fn advance(&mut self, next: &Cursor) -> bool {
        match (&self.0, &next.0) {
            (_, None) => false,
            (Some(current), Some(candidate)) if candidate <= current => false,
            (_, Some(candidate)) => {
                self.0 = Some(candidate.clone());
                true
            }
        }
    }

    /// Forget the position
    pub fn reset(&mut self) {
        self.0 = None;
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(token) => f.write_str(token),
            None => f.write_str("<absent>"),
        }
    }
}

/// One response of the remote log query, normalised to arrival order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogPage {
    /// Records oldest first
    pub records: Vec<LogRecord>,

    /// Position to resume from
    pub next_cursor: Cursor,
}

impl LogPage {
    pub fn new(records: Vec<LogRecord>, next_cursor: Cursor) -> Self {
        Self {
            records,
            next_cursor,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Classification of a failed remote call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure or timeout
    Network,
    /// Non-success response status
    Server,
    /// Response body did not match the expected shape
    Protocol,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Server => "server",
            Self::Protocol => "protocol",
        }
    }
}

/// Last error observed by a sync session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SyncError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.label(), self.message)
    }
}
