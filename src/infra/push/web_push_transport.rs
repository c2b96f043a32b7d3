use crate::domain::{models::subscription::PushSubscriptionRecord, ports::{DeliveryError, PushTransport}};
use async_trait::async_trait;
use std::sync::Arc;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

#[derive(Clone, Debug)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// Sends encrypted payloads through the browser vendors' push services.
pub struct WebPushTransport {
    vapid: VapidConfig,
    ttl_secs: u32,
    client: Arc<IsahcWebPushClient>,
}

impl WebPushTransport {
    pub fn new(vapid: VapidConfig, ttl_secs: u32) -> Result<Self, WebPushError> {
        let client = IsahcWebPushClient::new()?;
        Ok(Self { vapid, ttl_secs, client: Arc::new(client) })
    }

    async fn deliver(&self, subscription: &PushSubscriptionRecord, payload: &str) -> Result<(), WebPushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );
        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_ttl(self.ttl_secs);
        let mut signature = VapidSignatureBuilder::from_base64(&self.vapid.private_key, URL_SAFE_NO_PAD, &info)?;
        signature.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature.build()?);
        self.client.send(builder.build()?).await
    }
}

/// Maps the client's error onto the HTTP status the push service answered
/// with, so the registry can tell revoked endpoints from hiccups.
pub fn delivery_error(error: WebPushError) -> DeliveryError {
    let status = match &error {
        WebPushError::Unauthorized { .. } => Some(401),
        WebPushError::EndpointNotFound { .. } => Some(404),
        WebPushError::EndpointNotValid { .. } => Some(410),
        WebPushError::PayloadTooLarge { .. } => Some(413),
        WebPushError::BadRequest { .. } => Some(400),
        WebPushError::ServerError { .. } => Some(500),
        _ => None,
    };
    DeliveryError::new(status, error.to_string())
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(&self, subscription: &PushSubscriptionRecord, payload: &str) -> Result<(), DeliveryError> {
        self.deliver(subscription, payload).await.map_err(delivery_error)
    }
}
