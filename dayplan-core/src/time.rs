//! Wall-clock time normalization.
//!
//! Everything the client reasons about is local wall-clock time
//! ([`Timestamp`]). Conversion to and from the server's ISO-8601 strings
//! happens in [`crate::wire`]; this module only does calendar arithmetic.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{DayplanError, DayplanResult};

/// A local wall-clock instant.
pub type Timestamp = NaiveDateTime;

const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Naive formats accepted on ingress, most specific first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp as sent by the server or typed by a user.
///
/// RFC 3339 strings carry an offset and are converted to local time. Strings
/// without an offset are taken as local wall-clock time, and a bare date is
/// midnight. Returns `None` for anything else; callers drop the event rather
/// than fail.
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse an `HH:mm` time-of-day field. A trailing `:ss` is accepted and dropped.
pub fn parse_time_of_day(input: &str) -> DayplanResult<NaiveTime> {
    let trimmed = input.trim();

    NaiveTime::parse_from_str(trimmed, TIME_OF_DAY_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(|t| t.with_second(0).unwrap_or(t))
        .map_err(|_| DayplanError::Validation(format!("Invalid time '{input}'. Expected HH:mm")))
}

/// Compose a calendar day with an `HH:mm` time of day. Seconds and
/// sub-seconds are always zero.
pub fn combine(date: NaiveDate, time_of_day: &str) -> DayplanResult<Timestamp> {
    let time = parse_time_of_day(time_of_day)?;
    Ok(date.and_time(time))
}

/// Replace the time of day of `ts`, keeping its calendar day.
///
/// An absent or blank field leaves `ts` untouched, the same way an empty time
/// input in the event form keeps the original time.
pub fn apply_time_of_day(ts: Timestamp, time_of_day: Option<&str>) -> DayplanResult<Timestamp> {
    match time_of_day.map(str::trim) {
        None | Some("") => Ok(ts),
        Some(field) => combine(ts.date(), field),
    }
}

/// Roll `end` forward one calendar day if it precedes `start`.
///
/// Lets overnight events be entered with two same-day time pickers.
pub fn ensure_ordered(start: Timestamp, end: Timestamp) -> (Timestamp, Timestamp) {
    if end < start {
        (start, end + Duration::days(1))
    } else {
        (start, end)
    }
}

/// `HH:mm` rendering used to prefill the event form.
pub fn format_time_of_day(ts: Timestamp) -> String {
    ts.format(TIME_OF_DAY_FORMAT).to_string()
}

/// Whether two timestamps fall on the same calendar day.
pub fn same_day(a: Timestamp, b: Timestamp) -> bool {
    a.date() == b.date()
}
