use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, availability, reservation, recurring, schedule, push, notification};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Public booking flow
        .route("/api/v1/barbers/{id}/availability", get(availability::get_availability))
        .route("/api/v1/reservations", post(reservation::create_reservation))

        // Reservation lifecycle
        .route("/api/v1/reservations/manual", post(reservation::create_manual_reservation))
        .route("/api/v1/reservations/cancel-batch", post(reservation::cancel_batch))
        .route("/api/v1/reservations/{id}/cancel", post(reservation::cancel_reservation))
        .route("/api/v1/reservations/{id}/complete", post(reservation::complete_reservation))

        // Recurring appointments
        .route("/api/v1/recurring", post(recurring::create_recurring))
        .route("/api/v1/recurring/{id}", delete(recurring::delete_recurring))
        .route("/api/v1/barbers/{id}/conflicts", get(availability::get_conflicts))

        // Schedules & closures
        .route("/api/v1/barbers/{id}/schedule/{day}", put(schedule::upsert_work_day))
        .route("/api/v1/shop/hours/{day}", put(schedule::upsert_shop_hours))
        .route("/api/v1/barbers/{id}/closures", post(schedule::create_barber_closure))
        .route("/api/v1/closures", post(schedule::create_shop_closure).get(schedule::list_closures))
        .route("/api/v1/closures/{id}", delete(schedule::delete_closure))

        // Push devices
        .route("/api/v1/push/subscriptions", post(push::subscribe).delete(push::unsubscribe))
        .route("/api/v1/push/public-key", get(push::public_key))

        // Notifications
        .route("/api/v1/notifications", post(notification::send_notification))
        .route("/api/v1/notifications/logs", get(notification::list_logs))
        .route("/api/v1/notifications/logs/{id}", get(notification::get_log))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
