use chrono::{DateTime, SecondsFormat, Utc};

/// Source of wall-clock time for stamping records.
pub type Clock = fn() -> DateTime<Utc>;

pub fn system_clock() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 UTC with millisecond precision, e.g. `2026-10-18T09:30:00.000Z`.
/// Fixed width, so lexical order matches chronological order.
pub fn format(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Stamp for a mutation of a record last updated at `previous`. Never earlier
/// than `previous`, even when the clock has stepped backwards.
pub fn stamp_after(now: DateTime<Utc>, previous: &str) -> String {
    match parse(previous) {
        Some(prev) if prev > now => previous.to_string(),
        _ => format(now),
    }
}
