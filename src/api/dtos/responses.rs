use serde::Serialize;

use crate::domain::models::closure::{Closure, ClosurePolicy};
use crate::domain::models::recurring::RecurringAppointment;
use crate::domain::services::conflicts::ReservationConflict;
use crate::domain::services::reservation_service::BatchCancelOutcome;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ReservationResponse {
    pub fn ok(reservation_id: String, status: String) -> Self {
        Self { success: true, reservation_id: Some(reservation_id), status: Some(status) }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCancelResponse {
    pub success: bool,
    pub results: Vec<BatchCancelOutcome>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringResponse {
    pub success: bool,
    pub recurring: RecurringAppointment,
    pub conflicts: Vec<ReservationConflict>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosureResponse {
    pub success: bool,
    pub closure: Closure,
    pub policy: ClosurePolicy,
    pub affected_reservation_ids: Vec<String>,
    pub cancelled_reservation_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub enabled: bool,
    pub public_key: Option<String>,
}
