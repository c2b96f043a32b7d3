use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::models::closure::{Closure, ClosurePolicy};
use crate::domain::models::reservation::{Reservation, ReservationStatus};
use crate::domain::ports::{ErrorReporter, ReservationRepository, ScheduleRepository};
use crate::error::AppError;

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClosureError {
    #[error("{0}")]
    Validation(String),
    #[error("{} confirmed reservation(s) fall inside the closure", .0.len())]
    Conflict(Vec<String>),
    #[error("Closure not found")]
    NotFound,
    #[error("Database temporarily unavailable")]
    Database,
}

impl ClosureError {
    pub fn code(&self) -> &'static str {
        match self {
            ClosureError::Validation(_) => "VALIDATION_ERROR",
            ClosureError::Conflict(_) => "CLOSURE_CONFLICT",
            ClosureError::NotFound => "NOT_FOUND",
            ClosureError::Database => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateClosureCommand {
    /// `None` closes the whole shop.
    pub barber_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: String,
    pub policy: Option<ClosurePolicy>,
}

#[derive(Debug, Clone)]
pub struct ClosureCreated {
    pub closure: Closure,
    pub policy: ClosurePolicy,
    /// Confirmed reservations inside the range that were left untouched.
    pub affected: Vec<Reservation>,
    /// Reservations cancelled because of the closure; callers notify the customers.
    pub cancelled: Vec<Reservation>,
}

pub struct ClosureService {
    schedule_repo: Arc<dyn ScheduleRepository>,
    reservation_repo: Arc<dyn ReservationRepository>,
    default_policy: ClosurePolicy,
    reporter: Arc<dyn ErrorReporter>,
}

impl ClosureService {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        reservation_repo: Arc<dyn ReservationRepository>,
        default_policy: ClosurePolicy,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self { schedule_repo, reservation_repo, default_policy, reporter }
    }

    pub async fn create(&self, cmd: CreateClosureCommand) -> Result<ClosureCreated, ClosureError> {
        if cmd.start_date > cmd.end_date {
            return Err(ClosureError::Validation("startDate must not be after endDate".into()));
        }
        if cmd.created_by.trim().is_empty() {
            return Err(ClosureError::Validation("createdBy is required".into()));
        }
        let policy = cmd.policy.unwrap_or(self.default_policy);

        let overlapping = self.reservation_repo
            .list_confirmed_between_dates(cmd.barber_id.as_deref(), cmd.start_date, cmd.end_date)
            .await
            .map_err(|e| self.infra("closure.list_overlapping", e))?;

        if policy == ClosurePolicy::Block && !overlapping.is_empty() {
            return Err(ClosureError::Conflict(overlapping.into_iter().map(|r| r.id).collect()));
        }

        let closure = Closure::new(cmd.barber_id, cmd.start_date, cmd.end_date, cmd.reason, cmd.created_by);
        let closure = self.schedule_repo.create_closure(&closure).await
            .map_err(|e| self.infra("closure.create", e))?;
        info!(closure_id = %closure.id, barber_id = ?closure.barber_id, start = %closure.start_date, end = %closure.end_date, policy = ?policy, "closure created");

        let mut created = ClosureCreated { closure, policy, affected: Vec::new(), cancelled: Vec::new() };
        if policy != ClosurePolicy::Cancel {
            created.affected = overlapping;
            return Ok(created);
        }

        let reason = created.closure.reason.clone().unwrap_or_else(|| "Closed".to_string());
        for reservation in overlapping {
            match self.reservation_repo
                .transition(&reservation.id, ReservationStatus::Cancelled.as_str(), Some(SYSTEM_ACTOR), Some(&reason))
                .await
            {
                Ok(Some(cancelled)) => created.cancelled.push(cancelled),
                // Changed status concurrently; nothing left to cancel.
                Ok(None) => {}
                Err(e) => {
                    warn!(reservation_id = %reservation.id, "failed to cancel reservation for closure: {}", e);
                    created.affected.push(reservation);
                }
            }
        }
        Ok(created)
    }

    pub async fn list(&self, barber_id: Option<&str>, from: NaiveDate) -> Result<Vec<Closure>, ClosureError> {
        self.schedule_repo.list_closures_from(barber_id, from).await
            .map_err(|e| self.infra("closure.list", e))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClosureError> {
        match self.schedule_repo.delete_closure(id).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => return Err(ClosureError::NotFound),
            Err(e) => return Err(self.infra("closure.delete", e)),
        }
        info!(closure_id = %id, "closure deleted");
        Ok(())
    }

    fn infra(&self, context: &str, error: AppError) -> ClosureError {
        if let AppError::Validation(msg) = error {
            return ClosureError::Validation(msg);
        }
        if !error.is_transient() {
            self.reporter.report(context, &error);
        }
        ClosureError::Database
    }
}
