use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::api::dtos::requests::{AvailabilityQuery, ConflictQuery};
use crate::api::extractors::session::StaffSession;
use crate::domain::models::schedule::DayOfWeek;
use crate::domain::services::clock;
use crate::domain::services::conflicts::MAX_HORIZON_DAYS;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(barber_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let duration = query.duration.unwrap_or(state.config.slot_interval_min);
    if duration <= 0 {
        return Err(AppError::Validation("duration must be positive".into()));
    }
    state.repos.directory.find_barber(&barber_id).await?
        .ok_or(AppError::NotFound("Barber not found".into()))?;

    let availability = state.availability.resolve(&barber_id, query.date, duration, Utc::now()).await?;
    debug!(barber_id = %barber_id, date = %query.date, slots = availability.slots.len(), "availability resolved");
    Ok(Json(availability))
}

/// Advisory: confirmed one-off reservations a weekly pattern would collide with.
pub async fn get_conflicts(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(barber_id): Path<String>,
    Query(query): Query<ConflictQuery>,
) -> Result<impl IntoResponse, AppError> {
    let day: DayOfWeek = query.day_of_week.parse().map_err(AppError::Validation)?;
    let time = clock::parse_time_slot(&query.time_slot)
        .ok_or_else(|| AppError::Validation(format!("Invalid time slot: {}", query.time_slot)))?;
    if query.max_days_ahead.is_some_and(|d| !(0..=MAX_HORIZON_DAYS).contains(&d)) {
        return Err(AppError::Validation(format!("maxDaysAhead must be between 0 and {}", MAX_HORIZON_DAYS)));
    }

    let conflicts = state.conflicts.find_conflicts(&barber_id, day, time, query.max_days_ahead, Utc::now()).await?;
    Ok(Json(conflicts))
}
