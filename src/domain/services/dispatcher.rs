use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

use crate::domain::models::notification::{
    DispatchResult, LogCompletion, NotificationIntent, NotificationLogRecord, NotificationStatus, NotificationType,
};
use crate::domain::models::reservation::Reservation;
use crate::domain::models::subscription::{FailureKind, PushSubscriptionRecord, Recipient, RecipientType};
use crate::domain::ports::{DeliveryError, DirectoryRepository, ErrorReporter, NotificationLogRepository, PushTransport};
use crate::domain::services::clock::{self, ShopClock};
use crate::domain::services::renderer::NotificationRenderer;
use crate::domain::services::retry::{with_retry, RetryPolicy};
use crate::domain::services::subscription_registry::{classify, SubscriptionRegistry};
use crate::error::AppError;

pub const NO_ACTIVE_SUBSCRIPTIONS: &str = "no active subscriptions";
pub const PUSH_NOT_CONFIGURED: &str = "push delivery not configured";

pub struct NotificationDispatcher {
    registry: Arc<SubscriptionRegistry>,
    log_repo: Arc<dyn NotificationLogRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
    renderer: Arc<NotificationRenderer>,
    transport: Option<Arc<dyn PushTransport>>,
    send_timeout: Duration,
    retry: RetryPolicy,
    reporter: Arc<dyn ErrorReporter>,
}

impl NotificationDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        log_repo: Arc<dyn NotificationLogRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        renderer: Arc<NotificationRenderer>,
        transport: Option<Arc<dyn PushTransport>>,
        send_timeout: Duration,
        retry: RetryPolicy,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self { registry, log_repo, directory_repo, renderer, transport, send_timeout, retry, reporter }
    }

    pub fn push_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Delivers one intent to every active device of the recipient and
    /// records a single audit row for the event. Never returns an error:
    /// every failure is reflected in the result.
    pub async fn dispatch(&self, intent: NotificationIntent) -> DispatchResult {
        match self.preference_block(&intent).await {
            Ok(Some(reason)) => {
                info!(recipient_id = %intent.recipient.id, kind = intent.notification_type.as_str(), reason, "notification skipped");
                return DispatchResult::skipped(reason);
            }
            Ok(None) => {}
            Err(e) => return self.aborted("dispatch.preferences", e),
        }

        let payload = match self.renderer.render(&intent, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => return self.aborted("dispatch.render", e),
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => return self.aborted("dispatch.serialize", AppError::InternalWithMsg(e.to_string())),
        };

        let log = match self.log_repo.create(&NotificationLogRecord::pending(&intent, &payload)).await {
            Ok(log) => log,
            Err(e) => return self.aborted("dispatch.create_log", e),
        };

        let Some(transport) = self.transport.clone() else {
            return self.finish(&log.id, 0, 0, vec![PUSH_NOT_CONFIGURED.to_string()]).await;
        };

        let subscriptions = match self.registry.list_active(&intent.recipient).await {
            Ok(subs) => subs,
            Err(e) => {
                let message = e.to_string();
                self.reporter.report("dispatch.list_subscriptions", &e);
                return self.finish(&log.id, 0, 0, vec![message]).await;
            }
        };
        if subscriptions.is_empty() {
            return self.finish(&log.id, 0, 0, vec![NO_ACTIVE_SUBSCRIPTIONS.to_string()]).await;
        }

        let targeted = subscriptions.len();
        let body: Arc<str> = Arc::from(body);
        let mut sends = JoinSet::new();
        for subscription in subscriptions {
            let transport = transport.clone();
            let body = body.clone();
            let (timeout, retry) = (self.send_timeout, self.retry);
            sends.spawn(async move {
                let outcome = send_one(transport.as_ref(), &subscription, &body, timeout, retry).await;
                (subscription, outcome)
            });
        }

        let mut sent = 0;
        let mut errors = Vec::new();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((subscription, Ok(()))) => {
                    if let Err(e) = self.registry.record_success(&subscription).await {
                        warn!(subscription_id = %subscription.id, "failed to record delivery success: {}", e);
                    }
                    sent += 1;
                }
                Ok((subscription, Err(delivery))) => {
                    match self.registry.record_failure(&subscription, &delivery).await {
                        Ok(FailureKind::Permanent) => info!(subscription_id = %subscription.id, "subscription retired"),
                        Ok(FailureKind::Transient) => {}
                        Err(e) => warn!(subscription_id = %subscription.id, "failed to record delivery failure: {}", e),
                    }
                    errors.push(format!("{}: {}", subscription.device_type, delivery));
                }
                Err(join_error) => errors.push(format!("send task aborted: {}", join_error)),
            }
        }

        self.finish(&log.id, targeted, sent, errors).await
    }

    /// Runs `dispatch` in the background. Used after a booking commits so a
    /// delivery problem can never affect the committed write.
    pub fn spawn(self: &Arc<Self>, intent: NotificationIntent) {
        let dispatcher = self.clone();
        let span = info_span!("notification", kind = intent.notification_type.as_str(), recipient_id = %intent.recipient.id);
        tokio::spawn(async move {
            let result = dispatcher.dispatch(intent).await;
            info!(sent = result.sent, failed = result.failed, log_id = ?result.log_id, "background dispatch finished");
        }.instrument(span));
    }

    async fn preference_block(&self, intent: &NotificationIntent) -> Result<Option<&'static str>, AppError> {
        match intent.recipient.kind {
            RecipientType::Customer => {
                let Some(customer) = self.directory_repo.find_customer(&intent.recipient.id).await? else {
                    return Ok(Some("unknown recipient"));
                };
                if !customer.notifications_enabled {
                    return Ok(Some("notifications disabled"));
                }
                if intent.notification_type == NotificationType::Reminder && !customer.reminders_enabled {
                    return Ok(Some("reminders disabled"));
                }
            }
            RecipientType::Barber => {
                let Some(barber) = self.directory_repo.find_barber(&intent.recipient.id).await? else {
                    return Ok(Some("unknown recipient"));
                };
                if !barber.notifications_enabled {
                    return Ok(Some("notifications disabled"));
                }
            }
        }
        Ok(None)
    }

    fn aborted(&self, context: &str, error: AppError) -> DispatchResult {
        let message = error.to_string();
        if matches!(error, AppError::Validation(_)) {
            warn!(context, "notification rejected: {}", message);
        } else {
            self.reporter.report(context, &error);
        }
        DispatchResult { success: false, sent: 0, failed: 0, errors: vec![message], log_id: None, skipped_reason: None }
    }

    async fn finish(&self, log_id: &str, targeted: usize, sent: usize, errors: Vec<String>) -> DispatchResult {
        let failed = targeted - sent;
        let status = NotificationStatus::from_counts(sent, failed);
        let completion = LogCompletion {
            targeted: targeted as i32,
            succeeded: sent as i32,
            failed: failed as i32,
            status,
            error_message: (!errors.is_empty()).then(|| errors.join("; ")),
        };
        if let Err(e) = self.log_repo.complete(log_id, &completion).await {
            warn!(log_id, "failed to finalize notification log: {}", e);
        }
        info!(log_id, targeted, sent, failed, status = status.as_str(), "notification dispatched");
        DispatchResult {
            success: sent > 0,
            sent,
            failed,
            errors,
            log_id: Some(log_id.to_string()),
            skipped_reason: None,
        }
    }
}

/// One device: transient failures are retried, all attempts share one deadline.
async fn send_one(
    transport: &dyn PushTransport,
    subscription: &PushSubscriptionRecord,
    body: &str,
    timeout: Duration,
    retry: RetryPolicy,
) -> Result<(), DeliveryError> {
    let attempts = with_retry(
        "push.send",
        retry,
        |e: &DeliveryError| classify(e) == FailureKind::Transient,
        || transport.send(subscription, body),
    );
    match tokio::time::timeout(timeout, attempts).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(failure)) => Err(failure.error),
        Err(_) => Err(DeliveryError::new(None, format!("timed out after {} ms", timeout.as_millis()))),
    }
}

fn local_parts(shop_clock: &ShopClock, at: DateTime<Utc>) -> (String, String) {
    (
        shop_clock.local_date(at).format("%Y-%m-%d").to_string(),
        clock::format_time_slot(shop_clock.local_time(at)),
    )
}

pub fn new_reservation_intent(shop_clock: &ShopClock, reservation: &Reservation, service_name: Option<&str>) -> NotificationIntent {
    let (date, time) = local_parts(shop_clock, reservation.start_time);
    let mut context = json!({
        "customer_name": reservation.customer_name,
        "customer_phone": reservation.customer_phone,
        "date": date,
        "time": time,
    });
    if let Some(name) = service_name {
        context["service_name"] = json!(name);
    }
    NotificationIntent {
        notification_type: NotificationType::NewReservation,
        recipient: Recipient::barber(reservation.barber_id.clone()),
        reservation_id: Some(reservation.id.clone()),
        sender_id: Some(reservation.customer_id.clone()),
        context,
    }
}

pub fn cancellation_intent(shop_clock: &ShopClock, reservation: &Reservation) -> NotificationIntent {
    let (date, time) = local_parts(shop_clock, reservation.start_time);
    let mut context = json!({ "date": date, "time": time });
    if let Some(reason) = &reservation.cancel_reason {
        context["reason"] = json!(reason);
    }
    NotificationIntent {
        notification_type: NotificationType::ReservationCancelled,
        recipient: Recipient::customer(reservation.customer_id.clone()),
        reservation_id: Some(reservation.id.clone()),
        sender_id: reservation.cancelled_by.clone(),
        context,
    }
}

pub fn reminder_intent(shop_clock: &ShopClock, reservation: &Reservation, barber_name: Option<&str>) -> NotificationIntent {
    let (date, time) = local_parts(shop_clock, reservation.start_time);
    let mut context = json!({ "date": date, "time": time });
    if let Some(name) = barber_name {
        context["barber_name"] = json!(name);
    }
    NotificationIntent {
        notification_type: NotificationType::Reminder,
        recipient: Recipient::customer(reservation.customer_id.clone()),
        reservation_id: Some(reservation.id.clone()),
        sender_id: None,
        context,
    }
}
