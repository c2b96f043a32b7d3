use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::models::recurring::RecurringAppointment;
use crate::domain::models::schedule::{DayOfWeek, WorkWindow};
use crate::domain::ports::{DirectoryRepository, ErrorReporter, RecurringRepository};
use crate::domain::services::availability::{is_grid_slot, AvailabilityService};
use crate::domain::services::clock;
use crate::domain::services::conflicts::{ConflictChecker, ReservationConflict};
use crate::error::AppError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecurringError {
    #[error("Another recurring appointment already holds this slot")]
    SlotConflict,
    #[error("Customer is blocked from booking")]
    CustomerBlocked,
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("The barber is not working on this day")]
    BarberNotWorking,
    #[error("Invalid time slot: {0}")]
    InvalidTimeSlot(String),
    #[error("Service not found")]
    ServiceNotFound,
    #[error("Recurring appointment not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Database temporarily unavailable")]
    Database,
}

impl RecurringError {
    pub fn code(&self) -> &'static str {
        match self {
            RecurringError::SlotConflict => "SLOT_CONFLICT",
            RecurringError::CustomerBlocked => "CUSTOMER_BLOCKED",
            RecurringError::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            RecurringError::BarberNotWorking => "BARBER_NOT_WORKING",
            RecurringError::InvalidTimeSlot(_) => "INVALID_TIME_SLOT",
            RecurringError::ServiceNotFound => "SERVICE_NOT_FOUND",
            RecurringError::NotFound => "NOT_FOUND",
            RecurringError::Validation(_) => "VALIDATION_ERROR",
            RecurringError::Database => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRecurringCommand {
    pub barber_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub day_of_week: String,
    pub time_slot: String,
    pub created_by: String,
}

/// A created pattern together with the one-off reservations it collides
/// with. The collisions are reported, not resolved.
#[derive(Debug, Clone)]
pub struct RecurringCreated {
    pub recurring: RecurringAppointment,
    pub conflicts: Vec<ReservationConflict>,
}

pub struct RecurringService {
    recurring_repo: Arc<dyn RecurringRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
    availability: Arc<AvailabilityService>,
    conflicts: Arc<ConflictChecker>,
    reporter: Arc<dyn ErrorReporter>,
}

impl RecurringService {
    pub fn new(
        recurring_repo: Arc<dyn RecurringRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        availability: Arc<AvailabilityService>,
        conflicts: Arc<ConflictChecker>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self { recurring_repo, directory_repo, availability, conflicts, reporter }
    }

    pub async fn create(&self, cmd: CreateRecurringCommand, now: DateTime<Utc>) -> Result<RecurringCreated, RecurringError> {
        if cmd.barber_id.trim().is_empty() || cmd.customer_id.trim().is_empty()
            || cmd.service_id.trim().is_empty() || cmd.created_by.trim().is_empty() {
            return Err(RecurringError::Validation("barberId, customerId, serviceId and createdBy are required".into()));
        }
        let day: DayOfWeek = cmd.day_of_week.parse().map_err(RecurringError::Validation)?;
        let time = clock::parse_time_slot(&cmd.time_slot)
            .ok_or_else(|| RecurringError::InvalidTimeSlot(cmd.time_slot.clone()))?;

        let customer = self.directory_repo.find_customer(&cmd.customer_id).await
            .map_err(|e| self.infra("recurring.find_customer", e))?
            .ok_or(RecurringError::CustomerNotFound)?;
        if customer.is_blocked {
            return Err(RecurringError::CustomerBlocked);
        }
        let service = self.directory_repo.find_service(&cmd.service_id).await
            .map_err(|e| self.infra("recurring.find_service", e))?
            .ok_or(RecurringError::ServiceNotFound)?;

        let window = self.availability.work_window(&cmd.barber_id, day).await
            .map_err(|e| self.infra("recurring.work_window", e))?;
        if window == WorkWindow::NotWorking {
            return Err(RecurringError::BarberNotWorking);
        }
        if !is_grid_slot(window, self.availability.grid(service.duration_min as i64), time) {
            return Err(RecurringError::InvalidTimeSlot(cmd.time_slot.clone()));
        }

        let recurring = RecurringAppointment::new(
            cmd.barber_id,
            cmd.customer_id,
            cmd.service_id,
            day,
            clock::format_time_slot(time),
            cmd.created_by,
        );
        let created = match self.recurring_repo.create(&recurring).await {
            Ok(created) => created,
            Err(AppError::UniqueViolation(_)) => return Err(RecurringError::SlotConflict),
            Err(e) => return Err(self.infra("recurring.create", e)),
        };
        info!(recurring_id = %created.id, barber_id = %created.barber_id, day = %day, time = %created.time_slot, "recurring appointment created");

        // Advisory only: a failed lookup must not undo the created pattern.
        let conflicts = match self.conflicts.find_conflicts(&created.barber_id, day, time, None, now).await {
            Ok(conflicts) => conflicts,
            Err(e) => {
                warn!(recurring_id = %created.id, "conflict lookup failed: {}", e);
                Vec::new()
            }
        };
        Ok(RecurringCreated { recurring: created, conflicts })
    }

    pub async fn deactivate(&self, id: &str) -> Result<(), RecurringError> {
        let changed = self.recurring_repo.deactivate(id).await
            .map_err(|e| self.infra("recurring.deactivate", e))?;
        if !changed {
            return Err(RecurringError::NotFound);
        }
        info!(recurring_id = %id, "recurring appointment deactivated");
        Ok(())
    }

    fn infra(&self, context: &str, error: AppError) -> RecurringError {
        if let AppError::Validation(msg) = error {
            return RecurringError::Validation(msg);
        }
        if !error.is_transient() {
            self.reporter.report(context, &error);
        }
        RecurringError::Database
    }
}
