use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{BookingError, Result};
use crate::models::booking::EventRequest;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Validates a raw booking request and converts it to an [`EventRequest`].
/// Timestamps without an offset are read in `default_tz`.
pub fn normalize(
    raw_title: &str,
    raw_start: &str,
    raw_end: &str,
    default_tz: &Tz,
) -> Result<EventRequest> {
    let title = raw_title.trim();
    if title.is_empty() {
        return Err(BookingError::EmptyTitle);
    }

    let start = parse_timestamp(raw_start, default_tz).ok_or_else(|| {
        BookingError::MalformedTimestamp {
            field: "start",
            value: raw_start.trim().to_string(),
        }
    })?;
    let end = parse_timestamp(raw_end, default_tz).ok_or_else(|| {
        BookingError::MalformedTimestamp {
            field: "end",
            value: raw_end.trim().to_string(),
        }
    })?;

    if start >= end {
        return Err(BookingError::InvertedRange);
    }

    Ok(EventRequest {
        title: title.to_string(),
        start,
        end,
    })
}

pub fn parse_timestamp(raw: &str, default_tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // RFC 3339 without seconds, e.g. 2025-07-04T10:00+05:30
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    // Fall-back hours resolve to the first occurrence; skipped hours don't exist.
    default_tz
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
