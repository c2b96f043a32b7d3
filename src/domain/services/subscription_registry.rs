use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::subscription::{FailureKind, NewSubscriptionParams, PushSubscriptionRecord, Recipient};
use crate::domain::ports::{DeliveryError, SubscriptionRepository};
use crate::error::AppError;

/// Push service statuses meaning the endpoint is gone for good.
pub const PERMANENT_STATUSES: [u16; 3] = [401, 404, 410];

pub fn classify(error: &DeliveryError) -> FailureKind {
    match error.status {
        Some(code) if PERMANENT_STATUSES.contains(&code) => FailureKind::Permanent,
        _ => FailureKind::Transient,
    }
}

fn status_label(error: &DeliveryError) -> String {
    error.status.map(|c| c.to_string()).unwrap_or_else(|| "error".to_string())
}

/// Device lifecycle and health tracking.
pub struct SubscriptionRegistry {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionRegistry {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    pub async fn subscribe(&self, params: NewSubscriptionParams) -> Result<PushSubscriptionRecord, AppError> {
        if params.owner.id.trim().is_empty() {
            return Err(AppError::Validation("ownerId is required".into()));
        }
        if !params.endpoint.starts_with("https://") {
            return Err(AppError::Validation("endpoint must be an https URL".into()));
        }
        if params.p256dh.trim().is_empty() || params.auth.trim().is_empty() {
            return Err(AppError::Validation("keys.p256dh and keys.auth are required".into()));
        }
        let record = self.repo.upsert_by_endpoint(&PushSubscriptionRecord::new(params)).await?;
        info!(subscription_id = %record.id, device_type = %record.device_type, "push subscription stored");
        Ok(record)
    }

    pub async fn find(&self, endpoint: &str) -> Result<Option<PushSubscriptionRecord>, AppError> {
        self.repo.find_by_endpoint(endpoint).await
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> Result<bool, AppError> {
        let removed = self.repo.deactivate_by_endpoint(endpoint).await?;
        if removed {
            info!("push subscription deactivated by client");
        }
        Ok(removed)
    }

    pub async fn list_active(&self, recipient: &Recipient) -> Result<Vec<PushSubscriptionRecord>, AppError> {
        self.repo.list_active_for(recipient).await
    }

    pub async fn record_success(&self, subscription: &PushSubscriptionRecord) -> Result<(), AppError> {
        self.repo.record_success(&subscription.id, "201").await
    }

    /// Permanent failures retire the device at once; anything else only
    /// bumps its failure counter.
    pub async fn record_failure(&self, subscription: &PushSubscriptionRecord, error: &DeliveryError) -> Result<FailureKind, AppError> {
        let kind = classify(error);
        let status = status_label(error);
        match kind {
            FailureKind::Permanent => {
                warn!(subscription_id = %subscription.id, status = %status, "push endpoint revoked, deactivating");
                self.repo.deactivate(&subscription.id, &status).await?;
            }
            FailureKind::Transient => {
                self.repo.record_transient_failure(&subscription.id, &status).await?;
            }
        }
        Ok(kind)
    }
}
