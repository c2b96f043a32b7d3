use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::api::dtos::requests::CreateRecurringRequest;
use crate::api::dtos::responses::RecurringResponse;
use crate::api::extractors::session::StaffSession;
use crate::domain::services::recurring_service::{CreateRecurringCommand, RecurringError};
use crate::state::AppState;

pub async fn create_recurring(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Json(payload): Json<CreateRecurringRequest>,
) -> Result<impl IntoResponse, RecurringError> {
    let cmd = CreateRecurringCommand {
        barber_id: payload.barber_id,
        customer_id: payload.customer_id,
        service_id: payload.service_id,
        day_of_week: payload.day_of_week,
        time_slot: payload.time_slot,
        created_by: payload.created_by.unwrap_or(user.user_id),
    };
    let created = state.recurring.create(cmd, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(RecurringResponse {
        success: true,
        recurring: created.recurring,
        conflicts: created.conflicts,
    })))
}

pub async fn delete_recurring(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, RecurringError> {
    state.recurring.deactivate(&id).await?;
    Ok(Json(json!({ "success": true })))
}
