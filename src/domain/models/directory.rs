use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Barber {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Barber {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            is_active: true,
            notifications_enabled: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub is_blocked: bool,
    pub notifications_enabled: bool,
    pub reminders_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            phone,
            is_blocked: false,
            notifications_enabled: true,
            reminders_enabled: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_min: i32,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(name: String, duration_min: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            duration_min,
            created_at: Utc::now(),
        }
    }
}
