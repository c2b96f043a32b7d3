use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::domain::models::closure::ClosurePolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub app_base_url: String,
    pub shop_timezone: Tz,
    pub shop_open_time: NaiveTime,
    pub shop_close_time: NaiveTime,
    pub slot_interval_min: i64,
    pub conflict_horizon_days: i64,
    pub push_send_timeout_ms: u64,
    pub push_max_attempts: u32,
    pub push_ttl_secs: u32,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub reminder_lead_min: i64,
    pub reminder_poll_secs: u64,
    pub closure_policy: ClosurePolicy,
    pub session_retry_attempts: u32,
    pub session_retry_initial_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: parsed("PORT", 3000),
            app_base_url: env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            shop_timezone: parsed("SHOP_TIMEZONE", chrono_tz::UTC),
            shop_open_time: time_var("SHOP_OPEN_TIME", "09:00"),
            shop_close_time: time_var("SHOP_CLOSE_TIME", "19:00"),
            slot_interval_min: parsed("SLOT_INTERVAL_MIN", 30),
            conflict_horizon_days: parsed("CONFLICT_HORIZON_DAYS", 21),
            push_send_timeout_ms: parsed("PUSH_SEND_TIMEOUT_MS", 10_000),
            push_max_attempts: parsed("PUSH_MAX_ATTEMPTS", 2),
            push_ttl_secs: parsed("PUSH_TTL_SECS", 86_400),
            vapid_private_key: env::var("VAPID_PRIVATE_KEY").ok(),
            vapid_public_key: env::var("VAPID_PUBLIC_KEY").ok(),
            vapid_subject: env::var("VAPID_SUBJECT").ok(),
            reminder_lead_min: parsed("REMINDER_LEAD_MIN", 60),
            reminder_poll_secs: parsed("REMINDER_POLL_SECS", 60),
            closure_policy: parsed("CLOSURE_POLICY", ClosurePolicy::Keep),
            session_retry_attempts: parsed("SESSION_RETRY_ATTEMPTS", 3),
            session_retry_initial_ms: parsed("SESSION_RETRY_INITIAL_MS", 500),
        }
    }

    /// Baseline used by tests and tooling; everything except the database is defaulted.
    pub fn with_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            port: 0,
            app_base_url: "http://localhost:3000".to_string(),
            shop_timezone: chrono_tz::UTC,
            shop_open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            shop_close_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
            slot_interval_min: 30,
            conflict_horizon_days: 21,
            push_send_timeout_ms: 10_000,
            push_max_attempts: 2,
            push_ttl_secs: 86_400,
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            reminder_lead_min: 60,
            reminder_poll_secs: 60,
            closure_policy: ClosurePolicy::Keep,
            session_retry_attempts: 3,
            session_retry_initial_ms: 500,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| panic!("{} has an invalid value: {}", key, raw)),
        Err(_) => default,
    }
}

fn time_var(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| panic!("{} must be HH:MM, got {}", key, raw))
}
