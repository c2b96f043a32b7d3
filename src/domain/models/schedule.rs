use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
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
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday, DayOfWeek::Tuesday, DayOfWeek::Wednesday, DayOfWeek::Thursday,
        DayOfWeek::Friday, DayOfWeek::Saturday, DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn weekday(&self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
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

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|d| d.as_str() == lower || d.as_str()[..3] == lower)
            .ok_or_else(|| format!("Unknown day of week: {}", s))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-barber, per-day working configuration. Times are shop-local `HH:MM`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct WorkDay {
    pub id: String,
    pub barber_id: String,
    pub day_of_week: String,
    pub is_working: bool,
    pub start_time: String,
    pub end_time: String,
    pub updated_at: DateTime<Utc>,
}

impl WorkDay {
    pub fn new(barber_id: String, day: DayOfWeek, is_working: bool, start: String, end: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            barber_id,
            day_of_week: day.as_str().to_string(),
            is_working,
            start_time: start,
            end_time: end,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ShopHours {
    pub day_of_week: String,
    pub is_open: bool,
    pub open_time: String,
    pub close_time: String,
}

/// Resolved opening window for one barber on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkWindow {
    Open { start: NaiveTime, end: NaiveTime },
    NotWorking,
}

impl WorkWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        match self {
            WorkWindow::Open { start, end } => time >= *start && time < *end,
            WorkWindow::NotWorking => false,
        }
    }
}
