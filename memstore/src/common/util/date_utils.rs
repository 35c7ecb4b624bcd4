use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Formats a date the way it is written into serialized documents:
/// RFC 3339, millisecond precision, `Z` suffix.
#[inline]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the textual date forms accepted on read: RFC 3339 with any offset,
/// a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) or a bare `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return naive.and_hms_opt(0, 0, 0).map(|it| Utc.from_utc_datetime(&it));
    }
    None
}

/// Builds a date from milliseconds since the unix epoch.
#[inline]
pub fn date_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
