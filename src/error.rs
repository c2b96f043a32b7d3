use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::services::closure_service::ClosureError;
use crate::domain::services::recurring_service::RecurringError;
use crate::domain::services::reservation_service::ReservationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Normalizes a driver error at the repository boundary.
    ///
    /// SQLite reports unique violations as extended codes 2067 (UNIQUE) and
    /// 1555 (PRIMARY KEY); PostgreSQL as SQLSTATE 23505. Foreign key and CHECK
    /// failures become `Validation`.
    pub fn from_db(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            let code = db_err.code().unwrap_or_default();
            if code == "2067" || code == "1555" || code == "23505" || db_err.is_unique_violation() {
                let constraint = db_err.constraint().map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                return AppError::UniqueViolation(constraint);
            }
            // Foreign key (787 / 23503) and CHECK (275 / 23514) failures are bad input.
            if matches!(code.as_ref(), "787" | "275" | "23503" | "23514")
                || db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                return AppError::Validation(db_err.message().to_string());
            }
        }
        AppError::Database(e)
    }

    /// Transient errors are safe to retry with backoff. Only connection-class
    /// failures and lock contention qualify; decode or schema errors are bugs.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Database(e) => is_connection_failure(e),
            _ => false,
        }
    }
}

fn is_connection_failure(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().unwrap_or_default();
            // SQLite BUSY/LOCKED (plus extended forms); Postgres serialization,
            // deadlock and connection exceptions.
            matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517" | "40001" | "40P01")
                || code.starts_with("08")
        }
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Database temporarily unavailable".to_string())
            }
            AppError::UniqueViolation(_) => (StatusCode::CONFLICT, "Resource already exists (duplicate entry)".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// `{success: false, error: CODE, message}` with the status picked per code.
fn domain_failure(status: StatusCode, code: &str, message: String) -> Response {
    (status, Json(json!({
        "success": false,
        "error": code,
        "message": message
    }))).into_response()
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReservationError::SlotAlreadyTaken | ReservationError::CustomerDoubleBooking
            | ReservationError::InvalidTransition(_) => StatusCode::CONFLICT,
            ReservationError::Validation(_) => StatusCode::BAD_REQUEST,
            ReservationError::BarberNotWorking | ReservationError::OutsideWorkingHours
            | ReservationError::Closed(_) | ReservationError::CustomerBlocked => StatusCode::UNPROCESSABLE_ENTITY,
            ReservationError::ServiceNotFound | ReservationError::NotFound => StatusCode::NOT_FOUND,
            ReservationError::Database => StatusCode::SERVICE_UNAVAILABLE,
            ReservationError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };
        domain_failure(status, self.code(), self.to_string())
    }
}

impl IntoResponse for RecurringError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecurringError::SlotConflict => StatusCode::CONFLICT,
            RecurringError::Validation(_) | RecurringError::InvalidTimeSlot(_) => StatusCode::BAD_REQUEST,
            RecurringError::CustomerBlocked | RecurringError::BarberNotWorking => StatusCode::UNPROCESSABLE_ENTITY,
            RecurringError::CustomerNotFound | RecurringError::ServiceNotFound
            | RecurringError::NotFound => StatusCode::NOT_FOUND,
            RecurringError::Database => StatusCode::SERVICE_UNAVAILABLE,
        };
        domain_failure(status, self.code(), self.to_string())
    }
}

impl IntoResponse for ClosureError {
    fn into_response(self) -> Response {
        match self {
            ClosureError::Conflict(ids) => (StatusCode::CONFLICT, Json(json!({
                "success": false,
                "error": "CLOSURE_CONFLICT",
                "message": format!("{} confirmed reservation(s) fall inside the closure", ids.len()),
                "reservationIds": ids
            }))).into_response(),
            ClosureError::Validation(msg) => domain_failure(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ClosureError::NotFound => domain_failure(StatusCode::NOT_FOUND, "NOT_FOUND", "Closure not found".into()),
            ClosureError::Database => domain_failure(StatusCode::SERVICE_UNAVAILABLE, "DATABASE_ERROR", "Database temporarily unavailable".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contention_codes_map_to_conflict() {
        assert_eq!(ReservationError::SlotAlreadyTaken.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(ReservationError::CustomerDoubleBooking.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(RecurringError::SlotConflict.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_business_rules_are_unprocessable() {
        assert_eq!(ReservationError::BarberNotWorking.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ReservationError::Closed("Holiday".into()).into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ReservationError::Database.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = AppError::from_db(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_only_connection_failures_are_transient() {
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(AppError::Database(sqlx::Error::PoolClosed).is_transient());
        assert!(AppError::Database(sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))).is_transient());
        assert!(!AppError::Database(sqlx::Error::ColumnNotFound("slot_minute".into())).is_transient());
        assert!(!AppError::Database(sqlx::Error::Protocol("bad frame".into())).is_transient());
    }

    #[test]
    fn test_validation_is_not_transient() {
        assert!(!AppError::Validation("bad".into()).is_transient());
        assert!(!AppError::UniqueViolation("uq".into()).is_transient());
    }
}
