//! Text formatting shared by the log viewer and plain output.

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use botmon_types::LogRecord;

/// Parse a record timestamp (RFC 3339 or zap's `+0800` offset style)
fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// `HH:MM:SS.mmm` in local time, or the token unchanged when unparseable
pub fn format_timestamp(ts: &str) -> String {
    format_timestamp_in(ts, &Local)
}

fn format_timestamp_in<Tz: TimeZone>(ts: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_timestamp(ts) {
        Some(dt) => dt.with_timezone(tz).format("%H:%M:%S%.3f").to_string(),
        None => ts.to_string(),
    }
}

/// Cut `s` to at most `width` terminal columns, ending in `…` when cut
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// One-line rendering used by `--plain` mode
pub fn plain_line(record: &LogRecord, show_attributes: bool) -> String {
    let mut line = format!(
        "{} {:<5}",
        format_timestamp(&record.timestamp),
        record.level.as_query().to_uppercase()
    );
    if let Some(logger) = &record.source_component {
        line.push_str(&format!(" [{logger}]"));
    }
    line.push(' ');
    line.push_str(&record.message);
    if show_attributes && !record.attributes.is_empty() {
        line.push(' ');
        line.push_str(&record.attributes_inline());
    }
    if let Some(caller) = &record.call_site {
        line.push_str(&format!(" ({caller})"));
    }
    line
}
