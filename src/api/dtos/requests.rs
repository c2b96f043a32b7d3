use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::models::closure::ClosurePolicy;
use crate::domain::models::notification::NotificationType;
use crate::domain::models::subscription::RecipientType;

/// Booking form payload. `timeTimestamp` is the slot start in epoch
/// milliseconds; `dateTimestamp`, `dayName` and `dayNum` describe the day the
/// client displayed and must agree with it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub barber_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub date_timestamp: i64,
    pub time_timestamp: i64,
    pub day_name: Option<String>,
    pub day_num: Option<u32>,
    pub barber_notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CancelReservationRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBatchRequest {
    pub reservation_ids: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecurringRequest {
    pub barber_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub day_of_week: String,
    pub time_slot: String,
    pub created_by: Option<String>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub duration: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictQuery {
    pub day_of_week: String,
    pub time_slot: String,
    pub max_days_ahead: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWorkDayRequest {
    pub is_working: bool,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertShopHoursRequest {
    pub is_open: bool,
    pub open_time: String,
    pub close_time: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClosureRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub policy: Option<ClosurePolicy>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureListQuery {
    pub barber_id: Option<String>,
    pub from: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub owner_id: String,
    pub owner_type: RecipientType,
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub device_type: Option<String>,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub recipient_id: String,
    pub recipient_type: RecipientType,
    pub reservation_id: Option<String>,
    pub sender_id: Option<String>,
    #[serde(default)]
    pub context: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogQuery {
    pub recipient_id: String,
    pub recipient_type: RecipientType,
    pub limit: Option<i64>,
}
