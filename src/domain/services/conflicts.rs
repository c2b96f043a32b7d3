use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::models::reservation::Reservation;
use crate::domain::models::schedule::DayOfWeek;
use crate::domain::ports::ReservationRepository;
use crate::domain::services::clock::{self, ShopClock, SLOT_TOLERANCE_MIN};
use crate::error::AppError;

/// Longest look-ahead a conflict query may request.
pub const MAX_HORIZON_DAYS: i64 = 366;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationConflict {
    pub reservation_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub customer_name: String,
    pub customer_id: String,
}

/// Every date in `[today, today + horizon_days]` falling on `day`, paired with
/// the shop-local instant of `time` on that date. Instants at or before `now`
/// and local times skipped by DST are left out. The horizon is clamped to
/// `MAX_HORIZON_DAYS`.
pub fn occurrences(
    shop_clock: &ShopClock,
    day: DayOfWeek,
    time: NaiveTime,
    horizon_days: i64,
    now: DateTime<Utc>,
) -> Vec<(NaiveDate, DateTime<Utc>)> {
    let today = shop_clock.today(now);
    let horizon = horizon_days.clamp(0, MAX_HORIZON_DAYS) as u64;
    (0..=horizon)
        .map_while(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|date| clock::day_of_date(*date) == day)
        .filter_map(|date| shop_clock.to_instant(date, time).map(|instant| (date, instant)))
        .filter(|(_, instant)| *instant > now)
        .collect()
}

/// Matches reservations against occurrences using the same bucket tolerance
/// as availability.
pub fn match_conflicts(
    occurrences: &[(NaiveDate, DateTime<Utc>)],
    reservations: &[Reservation],
    time_slot: &str,
) -> Vec<ReservationConflict> {
    let mut conflicts: Vec<(DateTime<Utc>, ReservationConflict)> = Vec::new();
    for (date, instant) in occurrences {
        let bucket = clock::slot_bucket(*instant);
        for reservation in reservations.iter().filter(|r| r.is_confirmed() && clock::same_slot(r.slot_minute, bucket)) {
            conflicts.push((reservation.start_time, ReservationConflict {
                reservation_id: reservation.id.clone(),
                date: *date,
                time: time_slot.to_string(),
                customer_name: reservation.customer_name.clone(),
                customer_id: reservation.customer_id.clone(),
            }));
        }
    }
    conflicts.sort_by(|a, b| a.0.cmp(&b.0));
    conflicts.dedup_by(|a, b| a.1.reservation_id == b.1.reservation_id);
    conflicts.into_iter().map(|(_, c)| c).collect()
}

/// Advisory lookup of confirmed one-off reservations that a proposed weekly
/// pattern would collide with. Never blocks creation of the pattern.
pub struct ConflictChecker {
    reservation_repo: Arc<dyn ReservationRepository>,
    clock: ShopClock,
    default_horizon_days: i64,
}

impl ConflictChecker {
    pub fn new(reservation_repo: Arc<dyn ReservationRepository>, clock: ShopClock, default_horizon_days: i64) -> Self {
        Self { reservation_repo, clock, default_horizon_days: default_horizon_days.clamp(0, MAX_HORIZON_DAYS) }
    }

    pub async fn find_conflicts(
        &self,
        barber_id: &str,
        day: DayOfWeek,
        time: NaiveTime,
        max_days_ahead: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReservationConflict>, AppError> {
        let horizon = max_days_ahead.unwrap_or(self.default_horizon_days);
        if !(0..=MAX_HORIZON_DAYS).contains(&horizon) {
            return Err(AppError::Validation(format!("maxDaysAhead must be between 0 and {}", MAX_HORIZON_DAYS)));
        }
        let occurrences = occurrences(&self.clock, day, time, horizon, now);
        let (Some(first), Some(last)) = (occurrences.first(), occurrences.last()) else {
            return Ok(Vec::new());
        };

        let from_minute = clock::slot_bucket(first.1) - SLOT_TOLERANCE_MIN;
        let to_minute = clock::slot_bucket(last.1) + SLOT_TOLERANCE_MIN;
        let reservations = self.reservation_repo.list_confirmed_in_slots(barber_id, from_minute, to_minute).await?;

        Ok(match_conflicts(&occurrences, &reservations, &clock::format_time_slot(time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::reservation::{NewReservationParams, ReservationSource};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn booked(clock: &ShopClock, date: NaiveDate, time: NaiveTime, customer: &str) -> Reservation {
        let start = clock.to_instant(date, time).unwrap();
        Reservation::new(NewReservationParams {
            barber_id: "b1".into(),
            service_id: "s1".into(),
            customer_id: customer.into(),
            customer_name: format!("Customer {}", customer),
            customer_phone: "555".into(),
            start,
            slot_minute: clock::slot_bucket(start),
            local_date: date,
            day_of_week: clock::day_of_date(date),
            source: ReservationSource::SelfService,
            barber_notes: None,
        })
    }

    #[test]
    fn test_occurrences_cover_horizon() {
        let clock = ShopClock::new(chrono_tz::UTC);
        // Wednesday 2030-01-02 08:00
        let now = clock.to_instant(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(), hm(8, 0)).unwrap();
        let dates: Vec<NaiveDate> = occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), 21, now)
            .into_iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![
            NaiveDate::from_ymd_opt(2030, 1, 8).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2030, 1, 22).unwrap(),
        ]);
    }

    #[test]
    fn test_oversized_horizon_is_clamped() {
        let clock = ShopClock::new(chrono_tz::UTC);
        let now = clock.to_instant(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(), hm(8, 0)).unwrap();
        let capped = occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), MAX_HORIZON_DAYS, now);
        let huge = occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), i64::MAX, now);
        assert_eq!(huge, capped);
        assert_eq!(huge.len(), 52);
    }

    #[test]
    fn test_today_included_only_when_still_ahead() {
        let clock = ShopClock::new(chrono_tz::UTC);
        let tuesday = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let before = clock.to_instant(tuesday, hm(13, 0)).unwrap();
        let after = clock.to_instant(tuesday, hm(15, 0)).unwrap();
        assert_eq!(occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), 6, before).len(), 1);
        assert!(occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), 6, after).is_empty());
    }

    #[test]
    fn test_matches_sorted_and_ignores_other_times() {
        let clock = ShopClock::new(chrono_tz::UTC);
        let now = clock.to_instant(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), hm(0, 0)).unwrap();
        let occ = occurrences(&clock, DayOfWeek::Tuesday, hm(14, 0), 21, now);
        let d1 = NaiveDate::from_ymd_opt(2030, 1, 15).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap();
        let reservations = vec![
            booked(&clock, d1, hm(14, 0), "late"),
            booked(&clock, d2, hm(14, 0), "early"),
            booked(&clock, d2, hm(14, 30), "other"),
        ];

        let conflicts = match_conflicts(&occ, &reservations, "14:00");
        let ids: Vec<&str> = conflicts.iter().map(|c| c.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(conflicts[0].date, d2);
    }
}
