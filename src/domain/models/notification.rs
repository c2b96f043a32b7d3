use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::subscription::Recipient;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewReservation,
    ReservationCancelled,
    Reminder,
    Broadcast,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewReservation => "new_reservation",
            NotificationType::ReservationCancelled => "reservation_cancelled",
            NotificationType::Reminder => "reminder",
            NotificationType::Broadcast => "broadcast",
        }
    }

    /// Low-priority types never bump the client's unread badge.
    pub fn skips_badge(&self) -> bool {
        matches!(self, NotificationType::Broadcast)
    }
}

/// Stable audit status values; consumed by external tooling.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Partial,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Partial => "partial",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (0, _) => NotificationStatus::Failed,
            (_, 0) => NotificationStatus::Sent,
            _ => NotificationStatus::Partial,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Rendered push payload, serialized verbatim for the client service worker.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub actions: Vec<NotificationAction>,
    pub tag: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub reservation_id: Option<String>,
    pub skip_badge: bool,
    pub timestamp: i64,
}

/// Request to notify one recipient. `context` feeds the payload templates.
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub notification_type: NotificationType,
    pub recipient: Recipient,
    pub reservation_id: Option<String>,
    pub sender_id: Option<String>,
    pub context: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogRecord {
    pub id: String,
    pub notification_type: String,
    pub recipient_type: String,
    pub recipient_id: String,
    pub reservation_id: Option<String>,
    pub sender_id: Option<String>,
    pub title: String,
    pub body: String,
    pub devices_targeted: i32,
    pub devices_succeeded: i32,
    pub devices_failed: i32,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NotificationLogRecord {
    pub fn pending(intent: &NotificationIntent, payload: &NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type: intent.notification_type.as_str().to_string(),
            recipient_type: intent.recipient.kind.as_str().to_string(),
            recipient_id: intent.recipient.id.clone(),
            reservation_id: intent.reservation_id.clone(),
            sender_id: intent.sender_id.clone(),
            title: payload.title.clone(),
            body: payload.body.clone(),
            devices_targeted: 0,
            devices_succeeded: 0,
            devices_failed: 0,
            status: NotificationStatus::Pending.as_str().to_string(),
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Final counts written once a dispatch settles.
#[derive(Debug, Clone)]
pub struct LogCompletion {
    pub targeted: i32,
    pub succeeded: i32,
    pub failed: i32,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub log_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
}

impl DispatchResult {
    pub fn skipped(reason: &str) -> Self {
        Self {
            success: false,
            sent: 0,
            failed: 0,
            errors: Vec::new(),
            log_id: None,
            skipped_reason: Some(reason.to_string()),
        }
    }
}
