use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::services::clock;
use crate::domain::services::dispatcher::reminder_intent;
use crate::error::AppError;

const REMINDER_BATCH: i64 = 50;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!(
        lead_min = state.config.reminder_lead_min,
        poll_secs = state.config.reminder_poll_secs,
        "Starting reminder worker..."
    );

    loop {
        let span = info_span!("reminder_sweep");
        match run_reminder_sweep(&state, Utc::now()).instrument(span).await {
            Ok(0) => {}
            Ok(sent) => info!(reminders = sent, "reminder sweep finished"),
            Err(e) => error!("Failed to claim due reminders: {:?}", e),
        }
        sleep(Duration::from_secs(state.config.reminder_poll_secs.max(1))).await;
    }
}

/// Claims confirmed reservations starting within the lead window and sends
/// one reminder each. The claim stamps `reminder_sent_at`, so concurrent
/// workers never remind the same reservation twice.
pub async fn run_reminder_sweep(state: &Arc<AppState>, now: DateTime<Utc>) -> Result<usize, AppError> {
    let from_minute = clock::slot_bucket(now);
    let to_minute = clock::slot_bucket(now + ChronoDuration::minutes(state.config.reminder_lead_min));

    let mut total = 0;
    loop {
        let claimed = state.repos.reservations.claim_due_reminders(from_minute, to_minute, REMINDER_BATCH).await?;
        let batch_len = claimed.len();

        for reservation in claimed {
            let span = info_span!("reminder", reservation_id = %reservation.id, customer_id = %reservation.customer_id);
            async {
                let barber_name = match state.repos.directory.find_barber(&reservation.barber_id).await {
                    Ok(barber) => barber.map(|b| b.name),
                    Err(e) => {
                        warn!("barber lookup for reminder failed: {}", e);
                        None
                    }
                };
                let intent = reminder_intent(&state.clock, &reservation, barber_name.as_deref());
                let result = state.dispatcher.dispatch(intent).await;
                info!(sent = result.sent, failed = result.failed, skipped = ?result.skipped_reason, "reminder dispatched");
            }
                .instrument(span)
                .await;
        }

        total += batch_len;
        if (batch_len as i64) < REMINDER_BATCH {
            return Ok(total);
        }
    }
}
