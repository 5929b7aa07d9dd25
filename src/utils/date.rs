use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// First day of the year `date` belongs to.
pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Format a timestamp the way it is stored: RFC 3339, UTC, millisecond
/// precision. Fixed width, so stored values sort chronologically as text.
pub fn to_db_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored or user-supplied timestamp.
///
/// Accepts RFC 3339 (any offset) and the naive forms `YYYY-MM-DD HH:MM:SS`
/// and `YYYY-MM-DDTHH:MM:SS`, which are read as UTC.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Half-open `[start 00:00, end+1 00:00)` bounds of a day range as stored timestamps.
pub fn day_range_bounds(start: NaiveDate, end: NaiveDate) -> (String, String) {
    let from = start.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    let to = end
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc());
    (
        from.map(|d| to_db_ts(&d)).unwrap_or_default(),
        to.map(|d| to_db_ts(&d)).unwrap_or_default(),
    )
}
