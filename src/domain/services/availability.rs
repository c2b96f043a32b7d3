use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::models::closure::Closure;
use crate::domain::models::recurring::RecurringAppointment;
use crate::domain::models::reservation::Reservation;
use crate::domain::models::schedule::{DayOfWeek, ShopHours, WorkDay, WorkWindow};
use crate::domain::ports::{RecurringRepository, ReservationRepository, ScheduleRepository};
use crate::domain::services::clock::{self, ShopClock, SLOT_TOLERANCE_MIN};
use crate::error::AppError;

const TOTAL_MINUTES: u32 = 1440;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Available,
    Reserved,
    Recurring,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub time: String,
    pub starts_at: DateTime<Utc>,
    pub state: SlotState,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub barber_id: String,
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub working: bool,
    pub closed_reason: Option<String>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotGrid {
    pub interval_min: i64,
    pub duration_min: i64,
}

/// Effective window: barber override when present, then shop hours for the
/// weekday, then the configured default.
pub fn resolve_work_window(
    work_day: Option<&WorkDay>,
    shop_hours: Option<&ShopHours>,
    default_open: NaiveTime,
    default_close: NaiveTime,
) -> WorkWindow {
    if let Some(day) = work_day {
        if !day.is_working {
            return WorkWindow::NotWorking;
        }
        return parse_window(&day.start_time, &day.end_time);
    }
    if let Some(hours) = shop_hours {
        if !hours.is_open {
            return WorkWindow::NotWorking;
        }
        return parse_window(&hours.open_time, &hours.close_time);
    }
    WorkWindow::Open { start: default_open, end: default_close }
}

fn parse_window(start: &str, end: &str) -> WorkWindow {
    match (clock::parse_time_slot(start), clock::parse_time_slot(end)) {
        (Some(start), Some(end)) if start < end => WorkWindow::Open { start, end },
        _ => WorkWindow::NotWorking,
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// True when `time` is a grid start inside `window` leaving room for `duration_min`.
pub fn is_grid_slot(window: WorkWindow, grid: SlotGrid, time: NaiveTime) -> bool {
    let WorkWindow::Open { start, end } = window else {
        return false;
    };
    if grid.interval_min <= 0 || grid.duration_min <= 0 || time.second() != 0 {
        return false;
    }
    let (start_idx, mut end_idx, idx) = (minute_of_day(start), minute_of_day(end), minute_of_day(time));
    if end_idx == TOTAL_MINUTES - 1 { end_idx = TOTAL_MINUTES; }
    idx >= start_idx
        && (idx - start_idx) as i64 % grid.interval_min == 0
        && idx as i64 + grid.duration_min <= end_idx as i64
}

/// Builds the ordered slot list for one barber-day. Past slots are dropped;
/// the rest are marked reserved (confirmed reservation within the bucket
/// tolerance) or recurring (active weekly block), recurring taking precedence.
pub fn calculate_slots(
    shop_clock: &ShopClock,
    date: NaiveDate,
    window: WorkWindow,
    grid: SlotGrid,
    reservations: &[Reservation],
    recurring: &[RecurringAppointment],
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let WorkWindow::Open { start, end } = window else {
        return Vec::new();
    };
    if grid.interval_min <= 0 || grid.duration_min <= 0 {
        return Vec::new();
    }

    let day = clock::day_of_date(date);
    let recurring_buckets: Vec<i64> = recurring
        .iter()
        .filter(|r| r.is_active && r.day_of_week == day.as_str())
        .filter_map(|r| clock::parse_time_slot(&r.time_slot))
        .filter_map(|t| shop_clock.to_instant(date, t))
        .map(clock::slot_bucket)
        .collect();
    let reserved_buckets: Vec<i64> = reservations
        .iter()
        .filter(|r| r.is_confirmed())
        .map(|r| r.slot_minute)
        .collect();

    let start_idx = minute_of_day(start) as i64;
    let mut end_idx = minute_of_day(end) as i64;
    if end_idx == (TOTAL_MINUTES - 1) as i64 { end_idx = TOTAL_MINUTES as i64; }

    let mut slots = Vec::new();
    let mut cursor = start_idx;
    while cursor + grid.duration_min <= end_idx {
        let time = NaiveTime::from_hms_opt((cursor / 60) as u32, (cursor % 60) as u32, 0);
        cursor += grid.interval_min;

        let Some(time) = time else { continue };
        let Some(starts_at) = shop_clock.to_instant(date, time) else { continue };
        if starts_at <= now {
            continue;
        }

        let bucket = clock::slot_bucket(starts_at);
        let state = if recurring_buckets.iter().any(|b| clock::same_slot(*b, bucket)) {
            SlotState::Recurring
        } else if reserved_buckets.iter().any(|b| clock::same_slot(*b, bucket)) {
            SlotState::Reserved
        } else {
            SlotState::Available
        };

        slots.push(Slot { time: clock::format_time_slot(time), starts_at, state });
    }
    slots
}

pub struct AvailabilityService {
    schedule_repo: Arc<dyn ScheduleRepository>,
    reservation_repo: Arc<dyn ReservationRepository>,
    recurring_repo: Arc<dyn RecurringRepository>,
    clock: ShopClock,
    interval_min: i64,
    default_open: NaiveTime,
    default_close: NaiveTime,
}

impl AvailabilityService {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        reservation_repo: Arc<dyn ReservationRepository>,
        recurring_repo: Arc<dyn RecurringRepository>,
        clock: ShopClock,
        interval_min: i64,
        default_open: NaiveTime,
        default_close: NaiveTime,
    ) -> Self {
        Self { schedule_repo, reservation_repo, recurring_repo, clock, interval_min, default_open, default_close }
    }

    pub fn clock(&self) -> &ShopClock {
        &self.clock
    }

    pub fn grid(&self, duration_min: i64) -> SlotGrid {
        SlotGrid { interval_min: self.interval_min, duration_min }
    }

    pub async fn work_window(&self, barber_id: &str, day: DayOfWeek) -> Result<WorkWindow, AppError> {
        let work_day = self.schedule_repo.find_work_day(barber_id, day).await?;
        let shop_hours = if work_day.is_none() {
            self.schedule_repo.find_shop_hours(day).await?
        } else {
            None
        };
        Ok(resolve_work_window(work_day.as_ref(), shop_hours.as_ref(), self.default_open, self.default_close))
    }

    pub async fn closure_on(&self, barber_id: &str, date: NaiveDate) -> Result<Option<Closure>, AppError> {
        let closures = self.schedule_repo.list_closures_covering(barber_id, date).await?;
        Ok(closures.into_iter().next())
    }

    /// Slot list for `barber_id` on shop-local `date`.
    pub async fn resolve(&self, barber_id: &str, date: NaiveDate, duration_min: i64, now: DateTime<Utc>) -> Result<DayAvailability, AppError> {
        let day = clock::day_of_date(date);
        let mut result = DayAvailability {
            barber_id: barber_id.to_string(),
            date,
            day_of_week: day,
            working: false,
            closed_reason: None,
            slots: Vec::new(),
        };

        if let Some(closure) = self.closure_on(barber_id, date).await? {
            result.closed_reason = Some(closure.reason.unwrap_or_else(|| "Closed".to_string()));
            return Ok(result);
        }

        let window = self.work_window(barber_id, day).await?;
        if window == WorkWindow::NotWorking {
            return Ok(result);
        }
        result.working = true;

        let (from_minute, to_minute) = self.day_bucket_range(date);
        let reservations = self.reservation_repo.list_confirmed_in_slots(barber_id, from_minute, to_minute).await?;
        let recurring = self.recurring_repo.list_active_for_day(barber_id, day).await?;

        result.slots = calculate_slots(&self.clock, date, window, self.grid(duration_min), &reservations, &recurring, now);
        Ok(result)
    }

    /// Bucket range spanning the local day plus the tolerance on both edges.
    fn day_bucket_range(&self, date: NaiveDate) -> (i64, i64) {
        let start = self.clock.to_instant(date, NaiveTime::MIN)
            .map(clock::slot_bucket)
            .unwrap_or_else(|| clock::slot_bucket(date.and_time(NaiveTime::MIN).and_utc()) - 24 * 60);
        (start - SLOT_TOLERANCE_MIN, start + 25 * 60 + SLOT_TOLERANCE_MIN)
    }
}
