//! Access gate for dynamic QR redirects.
//!
//! Three gates run in a fixed order (date range, weekly window, scan limit)
//! and the first one that fails decides the verdict.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use chrono_tz::Tz;

use super::dto::{DayOfWeek, DenyReason, ScheduleConfig, TimeOfDay, TimeRange, Verdict};

const DATE_FORMAT: &str = "%B %-d, %Y";

/// Decide whether a scan at `now` may be redirected.
///
/// The schedule's `timezone` is used when it names a known IANA zone,
/// otherwise the process-local zone applies.
pub fn evaluate(config: Option<&ScheduleConfig>, scan_count: u64, now: DateTime<Utc>) -> Verdict {
    let Some(config) = config else {
        return Verdict::Allow;
    };

    match config.timezone.trim().parse::<Tz>() {
        Ok(zone) => evaluate_in(config, scan_count, now, &zone),
        Err(_) => evaluate_in(config, scan_count, now, &Local),
    }
}

/// Same as [`evaluate`] with the zone fixed by the caller.
pub fn evaluate_in<Z: TimeZone>(config: &ScheduleConfig, scan_count: u64, now: DateTime<Utc>, zone: &Z) -> Verdict {
    check_date_range(config, now, zone)
        .or_else(|| check_weekly_window(config, now, zone))
        .or_else(|| check_scan_limit(config, scan_count))
        .unwrap_or(Verdict::Allow)
}

fn check_date_range<Z: TimeZone>(config: &ScheduleConfig, now: DateTime<Utc>, zone: &Z) -> Option<Verdict> {
    if let Some(start) = &config.start_date {
        if now < start.resolve(zone) {
            return Some(Verdict::deny(
                DenyReason::TimeRestricted,
                format!(
                    "This QR code will be available starting {}.",
                    start.calendar_day(zone).format(DATE_FORMAT)
                ),
            ));
        }
    }

    if let Some(end) = &config.end_date {
        if now > end.resolve(zone) {
            return Some(Verdict::deny(
                DenyReason::Expired,
                format!(
                    "This QR code expired on {}.",
                    end.calendar_day(zone).format(DATE_FORMAT)
                ),
            ));
        }
    }

    None
}

fn check_weekly_window<Z: TimeZone>(config: &ScheduleConfig, now: DateTime<Utc>, zone: &Z) -> Option<Verdict> {
    if !config.has_enabled_ranges() {
        return None;
    }

    let local = now.with_timezone(zone);
    let current_day = DayOfWeek::from(local.weekday());
    let current_time = TimeOfDay::from_time(local.time());

    let Some(range) = config
        .time_ranges
        .iter()
        .find(|range| range.enabled && range.day == current_day)
    else {
        return Some(Verdict::deny(
            DenyReason::TimeRestricted,
            "This QR code is not available on this day of the week.",
        ));
    };

    if outside_window(current_time, range) {
        return Some(Verdict::deny(
            DenyReason::TimeRestricted,
            format!(
                "This QR code is only available between {} and {} on {}.",
                range.start, range.end, range.day
            ),
        ));
    }

    None
}

/// Inclusive at both ends. A bound that is not `HH:MM` is compared
/// lexicographically against the zero-padded current time.
fn outside_window(current: TimeOfDay, range: &TimeRange) -> bool {
    compare_bound(current, &range.start) == Ordering::Less
        || compare_bound(current, &range.end) == Ordering::Greater
}

fn compare_bound(current: TimeOfDay, bound: &str) -> Ordering {
    match TimeOfDay::parse(bound) {
        Some(bound) => current.cmp(&bound),
        None => current.to_string().as_str().cmp(bound),
    }
}

fn check_scan_limit(config: &ScheduleConfig, scan_count: u64) -> Option<Verdict> {
    let limit = config.scan_limit?;
    if scan_count >= limit {
        return Some(Verdict::deny(
            DenyReason::LimitReached,
            format!("This QR code has reached its scan limit of {limit}."),
        ));
    }
    None
}
