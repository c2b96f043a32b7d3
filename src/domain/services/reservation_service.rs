use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::models::reservation::{NewReservationParams, Reservation, ReservationSource, ReservationStatus};
use crate::domain::models::schedule::{DayOfWeek, WorkWindow};
use crate::domain::ports::{DirectoryRepository, ErrorReporter, RecurringRepository, ReservationRepository};
use crate::domain::services::availability::{is_grid_slot, AvailabilityService};
use crate::domain::services::clock::{self, ShopClock};
use crate::error::AppError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("The selected slot has just been taken")]
    SlotAlreadyTaken,
    #[error("The customer already holds this slot")]
    CustomerDoubleBooking,
    #[error("{0}")]
    Validation(String),
    #[error("The barber is not working on this day")]
    BarberNotWorking,
    #[error("The requested time is outside working hours")]
    OutsideWorkingHours,
    #[error("Booking is closed for this date: {0}")]
    Closed(String),
    #[error("Service not found")]
    ServiceNotFound,
    #[error("Customer is blocked from booking")]
    CustomerBlocked,
    #[error("Reservation not found")]
    NotFound,
    #[error("Reservation is {0} and cannot change status")]
    InvalidTransition(String),
    #[error("Database temporarily unavailable")]
    Database,
    #[error("Unexpected error")]
    Unknown,
}

impl ReservationError {
    pub fn code(&self) -> &'static str {
        match self {
            ReservationError::SlotAlreadyTaken => "SLOT_ALREADY_TAKEN",
            ReservationError::CustomerDoubleBooking => "CUSTOMER_DOUBLE_BOOKING",
            ReservationError::Validation(_) => "VALIDATION_ERROR",
            ReservationError::BarberNotWorking => "BARBER_NOT_WORKING",
            ReservationError::OutsideWorkingHours => "OUTSIDE_WORKING_HOURS",
            ReservationError::Closed(_) => "CLOSED",
            ReservationError::ServiceNotFound => "SERVICE_NOT_FOUND",
            ReservationError::CustomerBlocked => "CUSTOMER_BLOCKED",
            ReservationError::NotFound => "NOT_FOUND",
            ReservationError::InvalidTransition(_) => "INVALID_TRANSITION",
            ReservationError::Database => "DATABASE_ERROR",
            ReservationError::Unknown => "UNKNOWN_ERROR",
        }
    }

}

#[derive(Debug, Clone)]
pub struct CreateReservationCommand {
    pub barber_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub start: DateTime<Utc>,
    /// Shop-local date the client believes it is booking; must agree with `start`.
    pub expected_date: Option<NaiveDate>,
    pub expected_day: Option<DayOfWeek>,
    pub barber_notes: Option<String>,
    pub source: ReservationSource,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BatchCancelOutcome {
    pub reservation_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Commits reservations. Slot exclusivity is decided by the store at commit
/// time (exact minute via the unique index, neighbours within the slot
/// tolerance inside the insert transaction); this service only pre-validates
/// business rules and classifies the outcome. It never sends notifications.
pub struct ReservationService {
    reservation_repo: Arc<dyn ReservationRepository>,
    recurring_repo: Arc<dyn RecurringRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
    availability: Arc<AvailabilityService>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ReservationService {
    pub fn new(
        reservation_repo: Arc<dyn ReservationRepository>,
        recurring_repo: Arc<dyn RecurringRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        availability: Arc<AvailabilityService>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self { reservation_repo, recurring_repo, directory_repo, availability, reporter }
    }

    fn clock(&self) -> &ShopClock {
        self.availability.clock()
    }

    pub async fn create(&self, cmd: CreateReservationCommand, now: DateTime<Utc>) -> Result<Reservation, ReservationError> {
        validate_command(&cmd, now)?;

        let local_date = self.clock().local_date(cmd.start);
        let day = self.clock().day_of_week(cmd.start);
        let local_time = self.clock().local_time(cmd.start);

        if cmd.expected_date.is_some_and(|d| d != local_date) {
            return Err(ReservationError::Validation("Date does not match the selected time".into()));
        }
        if cmd.expected_day.is_some_and(|d| d != day) {
            return Err(ReservationError::Validation("Day name does not match the selected date".into()));
        }

        let service = self.directory_repo.find_service(&cmd.service_id).await
            .map_err(|e| self.infra("reservation.find_service", e))?
            .ok_or(ReservationError::ServiceNotFound)?;
        self.directory_repo.find_barber(&cmd.barber_id).await
            .map_err(|e| self.infra("reservation.find_barber", e))?
            .filter(|b| b.is_active)
            .ok_or_else(|| ReservationError::Validation("Unknown barber".into()))?;
        if let Some(customer) = self.directory_repo.find_customer(&cmd.customer_id).await
            .map_err(|e| self.infra("reservation.find_customer", e))?
            && customer.is_blocked {
            return Err(ReservationError::CustomerBlocked);
        }

        if let Some(closure) = self.availability.closure_on(&cmd.barber_id, local_date).await
            .map_err(|e| self.infra("reservation.closure_on", e))? {
            return Err(ReservationError::Closed(closure.reason.unwrap_or_else(|| "Closed".to_string())));
        }

        if cmd.source == ReservationSource::SelfService {
            let window = self.availability.work_window(&cmd.barber_id, day).await
                .map_err(|e| self.infra("reservation.work_window", e))?;
            if window == WorkWindow::NotWorking {
                return Err(ReservationError::BarberNotWorking);
            }
            let grid = self.availability.grid(service.duration_min as i64);
            if !is_grid_slot(window, grid, local_time) {
                return Err(ReservationError::OutsideWorkingHours);
            }
        }

        let bucket = clock::slot_bucket(cmd.start);
        let recurring = self.recurring_repo.list_active_for_day(&cmd.barber_id, day).await
            .map_err(|e| self.infra("reservation.recurring", e))?;
        let blocked_by_recurring = recurring.iter()
            .filter_map(|r| clock::parse_time_slot(&r.time_slot))
            .filter_map(|t| self.clock().to_instant(local_date, t))
            .any(|instant| clock::same_slot(clock::slot_bucket(instant), bucket));
        if blocked_by_recurring {
            info!(barber_id = %cmd.barber_id, start = %cmd.start, "slot held by recurring appointment");
            return Err(ReservationError::SlotAlreadyTaken);
        }

        let reservation = Reservation::new(NewReservationParams {
            barber_id: cmd.barber_id,
            service_id: cmd.service_id,
            customer_id: cmd.customer_id,
            customer_name: cmd.customer_name.trim().to_string(),
            customer_phone: cmd.customer_phone.trim().to_string(),
            start: cmd.start,
            slot_minute: bucket,
            local_date,
            day_of_week: day,
            source: cmd.source,
            barber_notes: cmd.barber_notes,
        });

        match self.reservation_repo.create_atomic(&reservation).await {
            Ok(created) => {
                info!(reservation_id = %created.id, barber_id = %created.barber_id, start = %created.start_time, "reservation committed");
                Ok(created)
            }
            Err(AppError::UniqueViolation(constraint)) => {
                warn!(barber_id = %reservation.barber_id, slot = bucket, constraint = %constraint, "lost slot race");
                self.classify_conflict(&reservation).await
            }
            Err(e) => Err(self.infra("reservation.create_atomic", e)),
        }
    }

    /// Distinguishes a competing customer from the same customer resubmitting.
    async fn classify_conflict(&self, attempted: &Reservation) -> Result<Reservation, ReservationError> {
        let holders = self.reservation_repo
            .list_confirmed_in_slots(
                &attempted.barber_id,
                attempted.slot_minute - clock::SLOT_TOLERANCE_MIN,
                attempted.slot_minute + clock::SLOT_TOLERANCE_MIN,
            )
            .await
            .map_err(|e| self.infra("reservation.classify_conflict", e))?;
        if holders.iter().any(|h| h.customer_id == attempted.customer_id) {
            Err(ReservationError::CustomerDoubleBooking)
        } else {
            Err(ReservationError::SlotAlreadyTaken)
        }
    }

    pub async fn find(&self, id: &str) -> Result<Reservation, ReservationError> {
        self.reservation_repo.find_by_id(id).await
            .map_err(|e| self.infra("reservation.find_by_id", e))?
            .ok_or(ReservationError::NotFound)
    }

    pub async fn cancel(&self, id: &str, actor: &str, reason: Option<&str>) -> Result<Reservation, ReservationError> {
        self.transition(id, ReservationStatus::Cancelled, Some(actor), reason).await
    }

    pub async fn complete(&self, id: &str) -> Result<Reservation, ReservationError> {
        self.transition(id, ReservationStatus::Completed, None, None).await
    }

    async fn transition(&self, id: &str, to: ReservationStatus, actor: Option<&str>, reason: Option<&str>) -> Result<Reservation, ReservationError> {
        let updated = self.reservation_repo.transition(id, to.as_str(), actor, reason).await
            .map_err(|e| self.infra("reservation.transition", e))?;
        match updated {
            Some(reservation) => {
                info!(reservation_id = %id, status = to.as_str(), "reservation status changed");
                Ok(reservation)
            }
            None => match self.reservation_repo.find_by_id(id).await.map_err(|e| self.infra("reservation.find_by_id", e))? {
                Some(existing) => Err(ReservationError::InvalidTransition(existing.status)),
                None => Err(ReservationError::NotFound),
            },
        }
    }

    /// Cancels each id independently; one failure does not stop the rest.
    pub async fn cancel_batch(&self, ids: &[String], actor: &str, reason: Option<&str>) -> (Vec<BatchCancelOutcome>, Vec<Reservation>) {
        let mut outcomes = Vec::with_capacity(ids.len());
        let mut cancelled = Vec::new();
        for id in ids {
            match self.cancel(id, actor, reason).await {
                Ok(reservation) => {
                    outcomes.push(BatchCancelOutcome { reservation_id: id.clone(), success: true, error: None });
                    cancelled.push(reservation);
                }
                Err(e) => outcomes.push(BatchCancelOutcome { reservation_id: id.clone(), success: false, error: Some(e.code()) }),
            }
        }
        (outcomes, cancelled)
    }

    fn infra(&self, context: &str, error: AppError) -> ReservationError {
        if let AppError::Validation(msg) = error {
            return ReservationError::Validation(msg);
        }
        if error.is_transient() {
            warn!(context, "transient storage failure: {}", error);
            ReservationError::Database
        } else {
            self.reporter.report(context, &error);
            ReservationError::Unknown
        }
    }
}

fn validate_command(cmd: &CreateReservationCommand, now: DateTime<Utc>) -> Result<(), ReservationError> {
    let required = [
        ("barberId", &cmd.barber_id),
        ("serviceId", &cmd.service_id),
        ("customerId", &cmd.customer_id),
        ("customerName", &cmd.customer_name),
        ("customerPhone", &cmd.customer_phone),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(ReservationError::Validation(format!("{} is required", field)));
    }
    if cmd.start <= now {
        return Err(ReservationError::Validation("Cannot book in the past".into()));
    }
    Ok(())
}
