use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dtos::requests::{NotificationLogQuery, SendNotificationRequest};
use crate::api::extractors::session::StaffSession;
use crate::domain::models::notification::NotificationIntent;
use crate::domain::models::subscription::Recipient;
use crate::error::AppError;
use crate::state::AppState;

const MAX_LOG_PAGE: i64 = 100;

/// Synchronous dispatch; the response carries the aggregate result. The
/// dispatch runs on its own task so a dropped request cannot cancel delivery
/// and leave the audit row pending.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    StaffSession(user): StaffSession,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.recipient_id.trim().is_empty() {
        return Err(AppError::Validation("recipientId is required".into()));
    }
    let context = if payload.context.is_null() { serde_json::json!({}) } else { payload.context };
    if !context.is_object() {
        return Err(AppError::Validation("context must be an object".into()));
    }

    let intent = NotificationIntent {
        notification_type: payload.notification_type,
        recipient: Recipient::new(payload.recipient_type, payload.recipient_id),
        reservation_id: payload.reservation_id,
        sender_id: payload.sender_id.or(Some(user.user_id)),
        context,
    };
    let dispatcher = state.dispatcher.clone();
    let result = tokio::spawn(async move { dispatcher.dispatch(intent).await })
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("dispatch task failed: {}", e)))?;
    Ok(Json(result))
}

pub async fn get_log(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let log = state.repos.notification_logs.find_by_id(&id).await?
        .ok_or(AppError::NotFound("Notification log not found".into()))?;
    Ok(Json(log))
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    StaffSession(_user): StaffSession,
    Query(query): Query<NotificationLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(20).clamp(1, MAX_LOG_PAGE);
    let logs = state.repos.notification_logs
        .list_for_recipient(&Recipient::new(query.recipient_type, query.recipient_id), limit)
        .await?;
    Ok(Json(logs))
}
