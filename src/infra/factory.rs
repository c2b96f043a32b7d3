use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{ErrorReporter, PushTransport};
use crate::domain::services::{
    availability::AvailabilityService, closure_service::ClosureService, clock::ShopClock,
    conflicts::ConflictChecker, dispatcher::NotificationDispatcher, recurring_service::RecurringService,
    renderer::NotificationRenderer, reservation_service::ReservationService, retry::RetryPolicy,
    session::SessionValidator, subscription_registry::SubscriptionRegistry,
};
use crate::infra::push::web_push_transport::{VapidConfig, WebPushTransport};
use crate::infra::reporting::TracingErrorReporter;
use crate::infra::repositories::{
    postgres_directory_repo::PostgresDirectoryRepo, postgres_notification_log_repo::PostgresNotificationLogRepo,
    postgres_recurring_repo::PostgresRecurringRepo, postgres_reservation_repo::PostgresReservationRepo,
    postgres_schedule_repo::PostgresScheduleRepo, postgres_session_repo::PostgresSessionRepo,
    postgres_subscription_repo::PostgresSubscriptionRepo,
    sqlite_directory_repo::SqliteDirectoryRepo, sqlite_notification_log_repo::SqliteNotificationLogRepo,
    sqlite_recurring_repo::SqliteRecurringRepo, sqlite_reservation_repo::SqliteReservationRepo,
    sqlite_schedule_repo::SqliteScheduleRepo, sqlite_session_repo::SqliteSessionRepo,
    sqlite_subscription_repo::SqliteSubscriptionRepo,
};
use crate::state::{AppState, Repositories};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(pool)
    };

    build_state(config, repos, push_transport(config))
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        reservations: Arc::new(SqliteReservationRepo::new(pool.clone())),
        recurring: Arc::new(SqliteRecurringRepo::new(pool.clone())),
        schedule: Arc::new(SqliteScheduleRepo::new(pool.clone())),
        directory: Arc::new(SqliteDirectoryRepo::new(pool.clone())),
        subscriptions: Arc::new(SqliteSubscriptionRepo::new(pool.clone())),
        notification_logs: Arc::new(SqliteNotificationLogRepo::new(pool.clone())),
        sessions: Arc::new(SqliteSessionRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        reservations: Arc::new(PostgresReservationRepo::new(pool.clone())),
        recurring: Arc::new(PostgresRecurringRepo::new(pool.clone())),
        schedule: Arc::new(PostgresScheduleRepo::new(pool.clone())),
        directory: Arc::new(PostgresDirectoryRepo::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
        notification_logs: Arc::new(PostgresNotificationLogRepo::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepo::new(pool)),
    }
}

/// Push is enabled only when the full VAPID triple is configured.
pub fn push_transport(config: &Config) -> Option<Arc<dyn PushTransport>> {
    let (private_key, public_key, subject) = match (&config.vapid_private_key, &config.vapid_public_key, &config.vapid_subject) {
        (Some(private_key), Some(public_key), Some(subject)) => (private_key.clone(), public_key.clone(), subject.clone()),
        (None, None, None) => {
            info!("VAPID keys not configured, push delivery disabled");
            return None;
        }
        _ => {
            warn!("Incomplete VAPID configuration, push delivery disabled");
            return None;
        }
    };
    match WebPushTransport::new(VapidConfig { private_key, public_key, subject }, config.push_ttl_secs) {
        Ok(transport) => Some(Arc::new(transport)),
        Err(e) => {
            warn!("Failed to create web push client, push delivery disabled: {}", e);
            None
        }
    }
}

/// Wires services over the given repositories. Tests pass their own transport.
pub fn build_state(config: &Config, repos: Repositories, transport: Option<Arc<dyn PushTransport>>) -> AppState {
    let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);
    let clock = ShopClock::new(config.shop_timezone);

    let availability = Arc::new(AvailabilityService::new(
        repos.schedule.clone(),
        repos.reservations.clone(),
        repos.recurring.clone(),
        clock,
        config.slot_interval_min,
        config.shop_open_time,
        config.shop_close_time,
    ));
    let conflicts = Arc::new(ConflictChecker::new(repos.reservations.clone(), clock, config.conflict_horizon_days));
    let reservations = Arc::new(ReservationService::new(
        repos.reservations.clone(),
        repos.recurring.clone(),
        repos.directory.clone(),
        availability.clone(),
        reporter.clone(),
    ));
    let recurring = Arc::new(RecurringService::new(
        repos.recurring.clone(),
        repos.directory.clone(),
        availability.clone(),
        conflicts.clone(),
        reporter.clone(),
    ));
    let closures = Arc::new(ClosureService::new(
        repos.schedule.clone(),
        repos.reservations.clone(),
        config.closure_policy,
        reporter.clone(),
    ));
    let registry = Arc::new(SubscriptionRegistry::new(repos.subscriptions.clone()));
    let renderer = Arc::new(NotificationRenderer::new(config.app_base_url.clone()).expect("Failed to load notification templates"));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        registry.clone(),
        repos.notification_logs.clone(),
        repos.directory.clone(),
        renderer,
        transport,
        Duration::from_millis(config.push_send_timeout_ms),
        RetryPolicy::new(config.push_max_attempts, Duration::from_millis(250)),
        reporter,
    ));
    let sessions = Arc::new(SessionValidator::new(
        repos.sessions.clone(),
        RetryPolicy::new(config.session_retry_attempts, Duration::from_millis(config.session_retry_initial_ms)),
    ));

    AppState {
        config: config.clone(),
        clock,
        repos,
        availability,
        conflicts,
        reservations,
        recurring,
        closures,
        registry,
        dispatcher,
        sessions,
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
