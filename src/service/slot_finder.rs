use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{BookingError, Result};
use crate::models::booking::{BusyInterval, Slot};

/// Free `slot_duration` slots inside the window, stepping by `align_to` from
/// boundaries aligned to the Unix epoch (top of the UTC hour for 1h).
pub fn find_free_slots(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    slot_duration: Duration,
    align_to: Duration,
) -> Result<Vec<Slot>> {
    find_free_slots_anchored(
        busy,
        window_start,
        window_end,
        slot_duration,
        align_to,
        DateTime::<Utc>::UNIX_EPOCH,
    )
}

/// Same as [`find_free_slots`] but candidate boundaries are
/// `anchor + k * align_to`. Anchoring at local midnight keeps slots on the
/// local top of the hour in zones with a half-hour offset.
pub fn find_free_slots_anchored(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    slot_duration: Duration,
    align_to: Duration,
    anchor: DateTime<Utc>,
) -> Result<Vec<Slot>> {
    if window_start >= window_end {
        return Err(BookingError::InvalidWindow);
    }
    if slot_duration <= Duration::zero() || align_to <= Duration::zero() {
        return Err(BookingError::InvalidDuration);
    }

    let merged = merge_busy(busy);
    let mut candidate_start = first_aligned(window_start, align_to, anchor);
    let mut cursor = 0;
    let mut free = Vec::new();

    while candidate_start + slot_duration <= window_end {
        let candidate_end = candidate_start + slot_duration;

        // Intervals ending at or before this start cannot touch any later candidate.
        while cursor < merged.len() && merged[cursor].end <= candidate_start {
            cursor += 1;
        }
        let conflict = merged[cursor..]
            .iter()
            .take_while(|b| b.start < candidate_end)
            .any(|b| candidate_start < b.end && candidate_end > b.start);

        if !conflict {
            free.push(Slot {
                start: candidate_start,
                end: candidate_end,
            });
        }
        candidate_start += align_to;
    }

    Ok(free)
}

/// Renders a slot in the display timezone, e.g. `10:00 AM to 11:00 AM`.
pub fn format_slot(slot: &Slot, tz: &Tz) -> String {
    format!(
        "{} to {}",
        slot.start.with_timezone(tz).format("%I:%M %p"),
        slot.end.with_timezone(tz).format("%I:%M %p")
    )
}

// Sorted, coalesced copy of the busy set. Degenerate intervals are dropped.
fn merge_busy(busy: &[BusyInterval]) -> Vec<BusyInterval> {
    let mut sorted: Vec<BusyInterval> = busy.iter().filter(|b| b.start < b.end).copied().collect();
    sorted.sort_by_key(|b| b.start);

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

fn first_aligned(
    window_start: DateTime<Utc>,
    align_to: Duration,
    anchor: DateTime<Utc>,
) -> DateTime<Utc> {
    let step = align_to.num_milliseconds().max(1);
    let offset = (window_start - anchor).num_milliseconds();
    let mut steps = offset.div_euclid(step);
    if offset.rem_euclid(step) != 0 {
        steps += 1;
    }
    let aligned = anchor + Duration::milliseconds(steps * step);
    // Sub-millisecond remainders are truncated by num_milliseconds.
    if aligned < window_start {
        aligned + align_to
    } else {
        aligned
    }
}

/// `hour`:00 on `day` in `tz`, as UTC. Hours past 23 roll into the next day.
/// Falls forward an hour when the local time does not exist.
pub fn local_instant(tz: &Tz, day: chrono::NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    let local = day.and_hms_opt(0, 0, 0)? + Duration::hours(hour as i64);
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
