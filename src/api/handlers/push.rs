use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{SubscribeRequest, UnsubscribeRequest};
use crate::api::dtos::responses::{PublicKeyResponse, SubscriptionResponse};
use crate::api::extractors::session::AuthSession;
use crate::domain::models::subscription::{NewSubscriptionParams, Recipient, RecipientType};
use crate::error::AppError;
use crate::state::AppState;

/// Registers or refreshes a device. Customers may only register their own devices.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    AuthSession(user): AuthSession,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !user.role.is_staff() && (payload.owner_type != RecipientType::Customer || payload.owner_id != user.user_id) {
        return Err(AppError::Forbidden("Cannot register devices for another user".into()));
    }

    let subscription = state.registry.subscribe(NewSubscriptionParams {
        owner: Recipient::new(payload.owner_type, payload.owner_id),
        endpoint: payload.endpoint,
        p256dh: payload.keys.p256dh,
        auth: payload.keys.auth,
        device_type: payload.device_type.unwrap_or_else(|| "web".to_string()),
        device_name: payload.device_name,
        user_agent: payload.user_agent,
    }).await?;

    info!(subscription_id = %subscription.id, device_type = %subscription.device_type, "device subscribed");
    Ok((StatusCode::CREATED, Json(SubscriptionResponse { success: true, subscription_id: subscription.id })))
}

/// Retires a device. Customers may only retire devices they own.
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    AuthSession(user): AuthSession,
    Json(payload): Json<UnsubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !user.role.is_staff()
        && let Some(existing) = state.registry.find(&payload.endpoint).await?
        && existing.customer_id.as_deref() != Some(user.user_id.as_str()) {
        return Err(AppError::Forbidden("Cannot remove another user's device".into()));
    }
    let removed = state.registry.unsubscribe(&payload.endpoint).await?;
    Ok(Json(json!({ "success": removed })))
}

pub async fn public_key(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let enabled = state.dispatcher.push_enabled();
    Json(PublicKeyResponse {
        enabled,
        public_key: state.config.vapid_public_key.clone().filter(|_| enabled),
    })
}
