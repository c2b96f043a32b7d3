use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use crate::api::dtos::requests::{CancelBatchRequest, CancelReservationRequest, CreateReservationRequest};
use crate::api::dtos::responses::{BatchCancelResponse, ReservationResponse};
use crate::api::extractors::session::{AuthSession, StaffSession};
use crate::domain::models::reservation::{Reservation, ReservationSource};
use crate::domain::models::schedule::DayOfWeek;
use crate::domain::models::session::Role;
use crate::domain::services::dispatcher::{cancellation_intent, new_reservation_intent};
use crate::domain::services::reservation_service::{CreateReservationCommand, ReservationError};
use crate::error::AppError;
use crate::state::AppState;

/// Self-service booking. Must land on the availability grid; customers may
/// only book for themselves.
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    AuthSession(user): AuthSession,
    Json(payload): Json<CreateReservationRequest>,
) -> Response {
    if user.role == Role::Customer && payload.customer_id != user.user_id {
        return AppError::Forbidden("Customers may only book for themselves".into()).into_response();
    }
    let cmd = match to_command(&state, payload, ReservationSource::SelfService) {
        Ok(cmd) => cmd,
        Err(e) => return e.into_response(),
    };
    match state.reservations.create(cmd, Utc::now()).await {
        Ok(reservation) => {
            notify_barber(&state, &reservation);
            (StatusCode::CREATED, Json(ReservationResponse::ok(reservation.id, reservation.status))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Staff booking on behalf of a customer; may fall outside the work window.
pub async fn create_manual_reservation(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ReservationError> {
    let cmd = to_command(&state, payload, ReservationSource::Manual)?;
    info!(user_id = %user.user_id, barber_id = %cmd.barber_id, "manual reservation requested");
    let reservation = state.reservations.create(cmd, Utc::now()).await?;
    notify_barber(&state, &reservation);
    Ok((StatusCode::CREATED, Json(ReservationResponse::ok(reservation.id, reservation.status))))
}

pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    AuthSession(user): AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<CancelReservationRequest>,
) -> Response {
    if user.role == Role::Customer {
        match state.reservations.find(&id).await {
            Ok(existing) if existing.customer_id != user.user_id => {
                return AppError::Forbidden("Reservation belongs to another customer".into()).into_response();
            }
            Ok(_) => {}
            Err(e) => return e.into_response(),
        }
    }

    match state.reservations.cancel(&id, &user.user_id, payload.reason.as_deref()).await {
        Ok(cancelled) => {
            // Customers cancelling their own booking are not notified about it.
            if cancelled.customer_id != user.user_id {
                state.dispatcher.spawn(cancellation_intent(&state.clock, &cancelled));
            }
            Json(ReservationResponse::ok(cancelled.id, cancelled.status)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn complete_reservation(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ReservationError> {
    let completed = state.reservations.complete(&id).await?;
    Ok(Json(ReservationResponse::ok(completed.id, completed.status)))
}

/// Conflict resolution: cancels each listed reservation independently.
pub async fn cancel_batch(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Json(payload): Json<CancelBatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.reservation_ids.is_empty() {
        return Err(AppError::Validation("reservationIds must not be empty".into()));
    }
    let (results, cancelled) = state.reservations
        .cancel_batch(&payload.reservation_ids, &user.user_id, payload.reason.as_deref())
        .await;
    for reservation in &cancelled {
        state.dispatcher.spawn(cancellation_intent(&state.clock, reservation));
    }
    info!(requested = payload.reservation_ids.len(), cancelled = cancelled.len(), "batch cancellation finished");
    Ok(Json(BatchCancelResponse { success: cancelled.len() == results.len(), results }))
}

fn to_command(state: &AppState, payload: CreateReservationRequest, source: ReservationSource) -> Result<CreateReservationCommand, ReservationError> {
    let start = DateTime::<Utc>::from_timestamp_millis(payload.time_timestamp)
        .ok_or_else(|| ReservationError::Validation("timeTimestamp is out of range".into()))?;
    let shown_day = DateTime::<Utc>::from_timestamp_millis(payload.date_timestamp)
        .ok_or_else(|| ReservationError::Validation("dateTimestamp is out of range".into()))?;
    let expected_date = state.clock.local_date(shown_day);

    if payload.day_num.is_some_and(|n| n != expected_date.day()) {
        return Err(ReservationError::Validation("dayNum does not match dateTimestamp".into()));
    }
    let expected_day = payload.day_name
        .as_deref()
        .map(str::parse::<DayOfWeek>)
        .transpose()
        .map_err(ReservationError::Validation)?;

    Ok(CreateReservationCommand {
        barber_id: payload.barber_id,
        service_id: payload.service_id,
        customer_id: payload.customer_id,
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        start,
        expected_date: Some(expected_date),
        expected_day,
        barber_notes: payload.barber_notes,
        source,
    })
}

/// Best-effort: runs after the commit and can never affect it.
fn notify_barber(state: &Arc<AppState>, reservation: &Reservation) {
    let state = state.clone();
    let reservation = reservation.clone();
    let span = info_span!("new_reservation_notification", reservation_id = %reservation.id);
    tokio::spawn(async move {
        let service_name = match state.repos.directory.find_service(&reservation.service_id).await {
            Ok(service) => service.map(|s| s.name),
            Err(e) => {
                warn!("service lookup for notification failed: {}", e);
                None
            }
        };
        let intent = new_reservation_intent(&state.clock, &reservation, service_name.as_deref());
        let result = state.dispatcher.dispatch(intent).await;
        info!(sent = result.sent, failed = result.failed, "barber notified");
    }.instrument(span));
}
