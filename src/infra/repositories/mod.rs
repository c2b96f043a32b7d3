pub mod sqlite_reservation_repo;
pub mod sqlite_recurring_repo;
pub mod sqlite_schedule_repo;
pub mod sqlite_directory_repo;
pub mod sqlite_subscription_repo;
pub mod sqlite_notification_log_repo;
pub mod sqlite_session_repo;

pub mod postgres_reservation_repo;
pub mod postgres_recurring_repo;
pub mod postgres_schedule_repo;
pub mod postgres_directory_repo;
pub mod postgres_subscription_repo;
pub mod postgres_notification_log_repo;
pub mod postgres_session_repo;
