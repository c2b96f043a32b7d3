use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Customer,
    Barber,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientType::Customer => "customer",
            RecipientType::Barber => "barber",
        }
    }
}

/// Owner of a device: exactly one of customer or barber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub kind: RecipientType,
    pub id: String,
}

impl Recipient {
    pub fn new(kind: RecipientType, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self { kind: RecipientType::Customer, id: id.into() }
    }

    pub fn barber(id: impl Into<String>) -> Self {
        Self { kind: RecipientType::Barber, id: id.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionRecord {
    pub id: String,
    pub customer_id: Option<String>,
    pub barber_id: Option<String>,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub device_type: String,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
    pub consecutive_failures: i32,
    pub last_delivery_status: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewSubscriptionParams {
    pub owner: Recipient,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub device_type: String,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
}

impl PushSubscriptionRecord {
    pub fn new(params: NewSubscriptionParams) -> Self {
        let now = Utc::now();
        let (customer_id, barber_id) = match params.owner.kind {
            RecipientType::Customer => (Some(params.owner.id), None),
            RecipientType::Barber => (None, Some(params.owner.id)),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id,
            barber_id,
            endpoint: params.endpoint,
            p256dh: params.p256dh,
            auth: params.auth,
            device_type: params.device_type,
            device_name: params.device_name,
            user_agent: params.user_agent,
            consecutive_failures: 0,
            last_delivery_status: None,
            last_used_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of one delivery attempt, as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The push service revoked the endpoint; the device is retired.
    Permanent,
    Transient,
}
