use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::domain::models::schedule::DayOfWeek;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationSource {
    SelfService,
    Manual,
}

impl ReservationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationSource::SelfService => "self_service",
            ReservationSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub barber_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub start_time: DateTime<Utc>,
    pub slot_minute: i64,
    pub local_date: NaiveDate,
    pub day_of_week: String,
    pub status: String,
    pub source: String,
    pub barber_notes: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancel_reason: Option<String>,
    pub version: i32,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewReservationParams {
    pub barber_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub start: DateTime<Utc>,
    pub slot_minute: i64,
    pub local_date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub source: ReservationSource,
    pub barber_notes: Option<String>,
}

impl Reservation {
    pub fn new(params: NewReservationParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            barber_id: params.barber_id,
            service_id: params.service_id,
            customer_id: params.customer_id,
            customer_name: params.customer_name,
            customer_phone: params.customer_phone,
            start_time: params.start,
            slot_minute: params.slot_minute,
            local_date: params.local_date,
            day_of_week: params.day_of_week.as_str().to_string(),
            status: ReservationStatus::Confirmed.as_str().to_string(),
            source: params.source.as_str().to_string(),
            barber_notes: params.barber_notes,
            cancelled_by: None,
            cancel_reason: None,
            version: 1,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed.as_str()
    }
}
