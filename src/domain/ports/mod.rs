use crate::domain::models::{
    reservation::Reservation, recurring::RecurringAppointment, closure::Closure,
    schedule::{WorkDay, ShopHours, DayOfWeek}, directory::{Barber, Customer, Service},
    subscription::{PushSubscriptionRecord, Recipient},
    notification::{NotificationLogRecord, LogCompletion}, session::SessionRecord,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Inserts a confirmed reservation in a single transaction. A competing
    /// confirmed row for the same barber and slot minute surfaces as
    /// `AppError::UniqueViolation`.
    async fn create_atomic(&self, reservation: &Reservation) -> Result<Reservation, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError>;
    /// Confirmed reservations whose slot minute lies in `[from_minute, to_minute]`.
    async fn list_confirmed_in_slots(&self, barber_id: &str, from_minute: i64, to_minute: i64) -> Result<Vec<Reservation>, AppError>;
    /// Confirmed reservations on local dates in `[start, end]`; `None` matches every barber.
    async fn list_confirmed_between_dates(&self, barber_id: Option<&str>, start: NaiveDate, end: NaiveDate) -> Result<Vec<Reservation>, AppError>;
    /// Moves a confirmed reservation to `to_status`, bumping its version.
    /// Returns `None` when the row is missing or no longer confirmed.
    async fn transition(&self, id: &str, to_status: &str, actor: Option<&str>, reason: Option<&str>) -> Result<Option<Reservation>, AppError>;
    /// Stamps `reminder_sent_at` on due reservations and returns only the rows this call claimed.
    async fn claim_due_reminders(&self, from_minute: i64, to_minute: i64, limit: i64) -> Result<Vec<Reservation>, AppError>;
}

#[async_trait]
pub trait RecurringRepository: Send + Sync {
    async fn create(&self, recurring: &RecurringAppointment) -> Result<RecurringAppointment, AppError>;
    async fn list_active_for_day(&self, barber_id: &str, day: DayOfWeek) -> Result<Vec<RecurringAppointment>, AppError>;
    async fn deactivate(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_work_day(&self, barber_id: &str, day: DayOfWeek) -> Result<Option<WorkDay>, AppError>;
    async fn upsert_work_day(&self, work_day: &WorkDay) -> Result<WorkDay, AppError>;
    async fn find_shop_hours(&self, day: DayOfWeek) -> Result<Option<ShopHours>, AppError>;
    async fn upsert_shop_hours(&self, hours: &ShopHours) -> Result<ShopHours, AppError>;
    async fn create_closure(&self, closure: &Closure) -> Result<Closure, AppError>;
    /// Barber-specific and shop-wide closures that cover `date`.
    async fn list_closures_covering(&self, barber_id: &str, date: NaiveDate) -> Result<Vec<Closure>, AppError>;
    /// Closures ending on or after `from`. With a barber, shop-wide closures are included.
    async fn list_closures_from(&self, barber_id: Option<&str>, from: NaiveDate) -> Result<Vec<Closure>, AppError>;
    async fn delete_closure(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn create_barber(&self, barber: &Barber) -> Result<Barber, AppError>;
    async fn find_barber(&self, id: &str) -> Result<Option<Barber>, AppError>;
    async fn create_customer(&self, customer: &Customer) -> Result<Customer, AppError>;
    async fn find_customer(&self, id: &str) -> Result<Option<Customer>, AppError>;
    async fn create_service(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_service(&self, id: &str) -> Result<Option<Service>, AppError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Creates the device or refreshes its keys and owner, reactivating it.
    async fn upsert_by_endpoint(&self, subscription: &PushSubscriptionRecord) -> Result<PushSubscriptionRecord, AppError>;
    async fn find_by_endpoint(&self, endpoint: &str) -> Result<Option<PushSubscriptionRecord>, AppError>;
    async fn list_active_for(&self, recipient: &Recipient) -> Result<Vec<PushSubscriptionRecord>, AppError>;
    async fn record_success(&self, id: &str, delivery_status: &str) -> Result<(), AppError>;
    async fn record_transient_failure(&self, id: &str, delivery_status: &str) -> Result<(), AppError>;
    async fn deactivate(&self, id: &str, delivery_status: &str) -> Result<(), AppError>;
    async fn deactivate_by_endpoint(&self, endpoint: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    async fn create(&self, log: &NotificationLogRecord) -> Result<NotificationLogRecord, AppError>;
    async fn complete(&self, id: &str, completion: &LogCompletion) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<NotificationLogRecord>, AppError>;
    async fn list_for_recipient(&self, recipient: &Recipient, limit: i64) -> Result<Vec<NotificationLogRecord>, AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &SessionRecord) -> Result<SessionRecord, AppError>;
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, AppError>;
}

/// Transport-level delivery failure. `status` carries the push service's
/// HTTP status when one was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub status: Option<u16>,
    pub message: String,
}

impl DeliveryError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} (status {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, subscription: &PushSubscriptionRecord, payload: &str) -> Result<(), DeliveryError>;
}

/// Sink for unexpected failures that are converted to generic error codes.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &AppError);
}
