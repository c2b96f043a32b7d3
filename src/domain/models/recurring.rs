use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::schedule::DayOfWeek;

/// A standing weekly block. Never materialized as reservation rows; the
/// availability resolver consults active entries on every lookup.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecurringAppointment {
    pub id: String,
    pub barber_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub day_of_week: String,
    pub time_slot: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl RecurringAppointment {
    pub fn new(barber_id: String, customer_id: String, service_id: String, day: DayOfWeek, time_slot: String, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            barber_id,
            customer_id,
            service_id,
            day_of_week: day.as_str().to_string(),
            time_slot,
            is_active: true,
            created_by,
            created_at: Utc::now(),
        }
    }
}
