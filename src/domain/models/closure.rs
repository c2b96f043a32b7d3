use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Inclusive date range during which booking is rejected. `barber_id = None`
/// closes the whole shop.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Closure {
    pub id: String,
    pub barber_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Closure {
    pub fn new(barber_id: Option<String>, start_date: NaiveDate, end_date: NaiveDate, reason: Option<String>, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            barber_id,
            start_date,
            end_date,
            reason,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// What happens to confirmed reservations that fall inside a new closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosurePolicy {
    /// Create the closure and report the affected reservations untouched.
    Keep,
    /// Refuse to create the closure while confirmed reservations overlap it.
    Block,
    /// Create the closure and cancel the affected reservations.
    Cancel,
}

impl FromStr for ClosurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(ClosurePolicy::Keep),
            "block" => Ok(ClosurePolicy::Block),
            "cancel" => Ok(ClosurePolicy::Cancel),
            other => Err(format!("Unknown closure policy: {}", other)),
        }
    }
}
