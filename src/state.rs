use std::sync::Arc;
use crate::domain::ports::{
    DirectoryRepository, NotificationLogRepository, RecurringRepository, ReservationRepository,
    ScheduleRepository, SessionRepository, SubscriptionRepository,
};
use crate::domain::services::{
    availability::AvailabilityService, closure_service::ClosureService, clock::ShopClock,
    conflicts::ConflictChecker, dispatcher::NotificationDispatcher, recurring_service::RecurringService,
    reservation_service::ReservationService, session::SessionValidator,
    subscription_registry::SubscriptionRegistry,
};
use crate::config::Config;

/// One storage backend's repositories.
#[derive(Clone)]
pub struct Repositories {
    pub reservations: Arc<dyn ReservationRepository>,
    pub recurring: Arc<dyn RecurringRepository>,
    pub schedule: Arc<dyn ScheduleRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub notification_logs: Arc<dyn NotificationLogRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub clock: ShopClock,
    pub repos: Repositories,
    pub availability: Arc<AvailabilityService>,
    pub conflicts: Arc<ConflictChecker>,
    pub reservations: Arc<ReservationService>,
    pub recurring: Arc<RecurringService>,
    pub closures: Arc<ClosureService>,
    pub registry: Arc<SubscriptionRegistry>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub sessions: Arc<SessionValidator>,
}
