use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Reference timezone for "today", schedule dates and time slots (UTC+8)
const LOCAL_OFFSET_SECS: i32 = 8 * 3600;

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

pub fn to_local(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&local_offset())
}

pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    to_local(at).date_naive()
}

/// Local calendar date of an epoch-millisecond timestamp
pub fn local_date_of_millis(millis: i64) -> Option<NaiveDate> {
    Utc.timestamp_millis_opt(millis).single().map(local_date)
}

/// Parse the upstream `DateTime_UTC` value ("2026-03-01 08:00:00")
pub fn parse_upstream_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace('T', " ");
    let trimmed_zone = normalized.trim_end_matches('Z');
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed_zone, fmt).ok())
        .map(|naive| naive.and_utc())
}
