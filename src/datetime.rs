// ABOUTME: Timestamp parsing and formatting shared by the report and Open311 jobs
// ABOUTME: Socrata stores floating timestamps in Central time; sources speak UTC

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

use crate::error::{EtlError, Result};

/// Local zone of the city; floating timestamps in the sink are in this zone.
pub const CENTRAL: Tz = chrono_tz::America::Chicago;

/// Formats accepted from report endpoints, tried in order.
const REPORT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const REPORT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse an ISO-8601 timestamp as an instant.
///
/// Offsets (including `Z`) are honored; a naive date-time or a bare date is
/// taken to be UTC.
pub fn parse_iso_utc(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = value.parse::<NaiveDateTime>() {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = value.parse::<NaiveDate>() {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(EtlError::InvalidInput(format!(
        "Invalid date format: {}. Expected ISO 8601 format.",
        value
    )))
}

/// Serialize an instant as ISO-8601 with a literal `Z` suffix.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serialize a naive timestamp without offset, showing microseconds only
/// when present.
pub fn format_floating(naive: &NaiveDateTime) -> String {
    if naive.nanosecond() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Interpret a floating timestamp as Central civil time.
///
/// During the fall-back overlap the earlier instant wins. Inside the
/// spring-forward gap the offset in force before the transition applies.
pub fn central_to_utc(naive: &NaiveDateTime) -> DateTime<Utc> {
    match CENTRAL.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let before = *naive - Duration::hours(1);
            let shifted = match CENTRAL.from_local_datetime(&before) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => Utc.from_utc_datetime(&before),
            };
            shifted + Duration::hours(1)
        }
    }
}

/// Convert a UTC timestamp string to floating Central time.
pub fn utc_to_floating_central(value: &str) -> Result<String> {
    let utc = parse_iso_utc(value)?;
    Ok(format_floating(&utc.with_timezone(&CENTRAL).naive_local()))
}

/// Parse the date formats report endpoints emit. Offsets, when present, are
/// dropped and the wall-clock time kept.
pub fn parse_report_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in REPORT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive);
        }
    }
    for format in REPORT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(chrono::NaiveTime::MIN));
        }
    }
    None
}
