//! Calendar-date to UTC range translation.
//!
//! The model supplies inclusive `YYYY-MM-DD` bounds which are calendar dates
//! in the *user's* day, not UTC. The filter sent to the memory store is a
//! half-open UTC interval: midnight at the start date in the user's zone up
//! to midnight after the end date (end exclusive, +1 day).

use assistant_core::CreatedRange;
use chrono::{Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Translate inclusive calendar-date bounds in `timezone` to a UTC
/// half-open interval.
///
/// Unknown timezones fall back to UTC. Returns `None` when a bound does not
/// parse or the range is inverted.
pub fn utc_range_for_dates(start: &str, end: &str, timezone: &str) -> Option<CreatedRange> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;

    let tz: Tz = timezone.parse().unwrap_or_else(|_| {
        warn!("Unknown timezone {:?}, falling back to UTC", timezone);
        Tz::UTC
    });

    // End is exclusive: advance one day past the inclusive bound.
    let end_exclusive = end_date.checked_add_days(Days::new(1))?;

    let start_local = tz
        .from_local_datetime(&start_date.and_hms_opt(0, 0, 0)?)
        .earliest()?;
    let end_local = tz
        .from_local_datetime(&end_exclusive.and_hms_opt(0, 0, 0)?)
        .earliest()?;

    let range = CreatedRange {
        start: start_local.with_timezone(&Utc),
        end: end_local.with_timezone(&Utc),
    };

    if range.start >= range.end {
        warn!("Inverted date range {} .. {}", start, end);
        return None;
    }

    Some(range)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Unparseable date {:?}: {}", raw, e);
            None
        }
    }
}
