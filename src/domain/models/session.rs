use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Barber,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Barber => "barber",
            Role::Customer => "customer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Role::Admin),
            "barber" => Some(Role::Barber),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Barber)
    }
}

/// Persisted session; only the SHA-256 of the bearer token is stored.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub token_hash: String,
    pub user_id: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns the record to persist and the raw token to hand to the client.
    pub fn issue(user_id: String, role: Role, ttl: Duration) -> (Self, String) {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let now = Utc::now();
        let record = Self {
            id: Uuid::new_v4().to_string(),
            token_hash: hash_token(&token),
            user_id,
            role: role.as_str().to_string(),
            expires_at: now + ttl,
            created_at: now,
        };
        (record, token)
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub role: Role,
}

/// Explicitly passed session handle. Validation reads it and never mutates it.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
}
