use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{ClosureListQuery, CreateClosureRequest, UpsertShopHoursRequest, UpsertWorkDayRequest};
use crate::api::dtos::responses::ClosureResponse;
use crate::api::extractors::session::StaffSession;
use crate::domain::models::schedule::{DayOfWeek, ShopHours, WorkDay};
use crate::domain::services::closure_service::{ClosureError, CreateClosureCommand};
use crate::domain::services::clock;
use crate::domain::services::dispatcher::cancellation_intent;
use crate::error::AppError;
use crate::state::AppState;

pub async fn upsert_work_day(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path((barber_id, day)): Path<(String, String)>,
    Json(payload): Json<UpsertWorkDayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let day: DayOfWeek = day.parse().map_err(AppError::Validation)?;
    let (start, end) = window(&payload.start_time, &payload.end_time, payload.is_working)?;
    state.repos.directory.find_barber(&barber_id).await?
        .ok_or(AppError::NotFound("Barber not found".into()))?;

    let work_day = WorkDay::new(barber_id, day, payload.is_working, start, end);
    let saved = state.repos.schedule.upsert_work_day(&work_day).await?;
    info!(barber_id = %saved.barber_id, day = %day, working = saved.is_working, "work day updated");
    Ok(Json(saved))
}

pub async fn upsert_shop_hours(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(day): Path<String>,
    Json(payload): Json<UpsertShopHoursRequest>,
) -> Result<impl IntoResponse, AppError> {
    let day: DayOfWeek = day.parse().map_err(AppError::Validation)?;
    let (open_time, close_time) = window(&payload.open_time, &payload.close_time, payload.is_open)?;
    let hours = ShopHours {
        day_of_week: day.as_str().to_string(),
        is_open: payload.is_open,
        open_time,
        close_time,
    };
    let saved = state.repos.schedule.upsert_shop_hours(&hours).await?;
    info!(day = %day, open = saved.is_open, "shop hours updated");
    Ok(Json(saved))
}

pub async fn create_barber_closure(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Path(barber_id): Path<String>,
    Json(payload): Json<CreateClosureRequest>,
) -> Result<impl IntoResponse, ClosureError> {
    create_closure(&state, Some(barber_id), user.user_id, payload).await
}

pub async fn create_shop_closure(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Json(payload): Json<CreateClosureRequest>,
) -> Result<impl IntoResponse, ClosureError> {
    create_closure(&state, None, user.user_id, payload).await
}

/// Closures still in effect or upcoming; `from` defaults to the shop-local today.
pub async fn list_closures(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Query(query): Query<ClosureListQuery>,
) -> Result<impl IntoResponse, ClosureError> {
    let from = query.from.unwrap_or_else(|| state.clock.today(Utc::now()));
    let closures = state.closures.list(query.barber_id.as_deref(), from).await?;
    Ok(Json(closures))
}

pub async fn delete_closure(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ClosureError> {
    state.closures.delete(&id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn create_closure(
    state: &Arc<AppState>,
    barber_id: Option<String>,
    created_by: String,
    payload: CreateClosureRequest,
) -> Result<(StatusCode, Json<ClosureResponse>), ClosureError> {
    let created = state.closures.create(CreateClosureCommand {
        barber_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        reason: payload.reason,
        created_by,
        policy: payload.policy,
    }).await?;

    for reservation in &created.cancelled {
        state.dispatcher.spawn(cancellation_intent(&state.clock, reservation));
    }

    Ok((StatusCode::CREATED, Json(ClosureResponse {
        success: true,
        affected_reservation_ids: created.affected.into_iter().map(|r| r.id).collect(),
        cancelled_reservation_ids: created.cancelled.into_iter().map(|r| r.id).collect(),
        closure: created.closure,
        policy: created.policy,
    })))
}

/// Normalized `HH:MM` pair; open windows must be non-empty.
fn window(start: &str, end: &str, open: bool) -> Result<(String, String), AppError> {
    let start_time = clock::parse_time_slot(start)
        .ok_or_else(|| AppError::Validation(format!("Invalid time: {}", start)))?;
    let end_time = clock::parse_time_slot(end)
        .ok_or_else(|| AppError::Validation(format!("Invalid time: {}", end)))?;
    if open && start_time >= end_time {
        return Err(AppError::Validation("Start time must be before end time".into()));
    }
    Ok((clock::format_time_slot(start_time), clock::format_time_slot(end_time)))
}
