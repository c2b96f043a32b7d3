use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::models::schedule::DayOfWeek;

/// Bucket tolerance shared by the resolver, the conflict checker and the
/// reservation writer.
pub const SLOT_TOLERANCE_MIN: i64 = 1;

/// Wall-clock conversions pinned to the shop's civil timezone. Never uses the
/// host's local clock.
#[derive(Debug, Clone, Copy)]
pub struct ShopClock {
    tz: Tz,
}

impl ShopClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Ambiguous local times (DST fall-back) resolve to the earliest instant;
    /// skipped local times (spring-forward) have no instant.
    pub fn to_instant(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        match self.tz.from_local_datetime(&date.and_time(time)) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.tz).time()
    }

    pub fn day_of_week(&self, instant: DateTime<Utc>) -> DayOfWeek {
        self.local_date(instant).weekday().into()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_date(now)
    }
}

pub fn day_of_date(date: NaiveDate) -> DayOfWeek {
    date.weekday().into()
}

/// Whole minutes since the Unix epoch.
pub fn slot_bucket(instant: DateTime<Utc>) -> i64 {
    instant.timestamp().div_euclid(60)
}

pub fn same_slot(a: i64, b: i64) -> bool {
    (a - b).abs() <= SLOT_TOLERANCE_MIN
}

/// Parses a strict `HH:MM` time-of-day.
pub fn parse_time_slot(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").ok()
}

pub fn format_time_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
