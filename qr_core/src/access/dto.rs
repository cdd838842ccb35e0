use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Capitalised name used in visitor-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub day: DayOfWeek,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub enabled: bool,
}

impl TimeRange {
    pub fn new(day: DayOfWeek, start: &str, end: &str) -> Self {
        Self {
            day,
            start: start.to_string(),
            end: end.to_string(),
            enabled: true,
        }
    }
}

/// Minute of the day parsed from an `HH:MM` string.
///
/// Ordering is numeric, which agrees with lexicographic ordering of the
/// zero-padded strings but also handles `9:00` and `24:00` correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(24 * 60);

    pub fn from_time(time: NaiveTime) -> Self {
        TimeOfDay((time.hour() * 60 + time.minute()) as u16)
    }

    fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay((hour * 60 + minute) as u16))
        } else if hour == 24 && minute == 0 {
            Some(Self::END_OF_DAY)
        } else {
            None
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let (hour, minute) = value.trim().split_once(':')?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return None;
        }
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::from_hm(hour.parse().ok()?, minute.parse().ok()?)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateValue {
    Day(NaiveDate),
    Local(NaiveDateTime),
    Instant(DateTime<FixedOffset>),
}

// Real DST gaps are at most a few hours wide.
const MAX_GAP_STEPS: i64 = 4 * 4;

/// `startDate` / `endDate` as stored on the schedule.
///
/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM[:SS]`, or a full RFC 3339
/// timestamp. Date-only and naive values are read in the schedule's zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleDate {
    raw: String,
    value: DateValue,
}

impl ScheduleDate {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let value = if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            DateValue::Instant(instant)
        } else if let Ok(local) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
            DateValue::Local(local)
        } else if let Ok(local) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M") {
            DateValue::Local(local)
        } else if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            DateValue::Day(day)
        } else {
            return Err(format!("invalid schedule date: {raw}"));
        };

        Ok(Self {
            raw: trimmed.to_string(),
            value,
        })
    }

    /// The instant this date denotes when read in `zone`.
    ///
    /// A local time inside a DST gap resolves to the first valid local
    /// quarter hour after it.
    pub fn resolve<Z: TimeZone>(&self, zone: &Z) -> DateTime<Utc> {
        let naive = match self.value {
            DateValue::Instant(instant) => return instant.with_timezone(&Utc),
            DateValue::Local(local) => local,
            DateValue::Day(day) => day.and_time(NaiveTime::MIN),
        };

        (0..=MAX_GAP_STEPS)
            .map(|step| naive + Duration::minutes(15 * step))
            .find_map(|candidate| zone.from_local_datetime(&candidate).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }

    /// Calendar day shown to visitors. Date-only values keep the configured
    /// day; other forms use the day of the resolved instant in `zone`.
    pub fn calendar_day<Z: TimeZone>(&self, zone: &Z) -> NaiveDate {
        match self.value {
            DateValue::Day(day) => day,
            _ => self.resolve(zone).with_timezone(zone).date_naive(),
        }
    }
}

impl TryFrom<String> for ScheduleDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScheduleDate> for String {
    fn from(date: ScheduleDate) -> Self {
        date.raw
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    #[serde(default)]
    pub time_ranges: Vec<TimeRange>,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub start_date: Option<ScheduleDate>,
    #[serde(default)]
    pub end_date: Option<ScheduleDate>,
    #[serde(default)]
    pub scan_limit: Option<u64>,
}

impl ScheduleConfig {
    pub fn has_enabled_ranges(&self) -> bool {
        self.time_ranges.iter().any(|range| range.enabled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    Expired,
    TimeRestricted,
    LimitReached,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Expired => "EXPIRED",
            DenyReason::TimeRestricted => "TIME_RESTRICTED",
            DenyReason::LimitReached => "LIMIT_REACHED",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny { reason: DenyReason, message: String },
}

impl Verdict {
    pub fn deny(reason: DenyReason, message: impl Into<String>) -> Self {
        Verdict::Deny {
            reason,
            message: message.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}
