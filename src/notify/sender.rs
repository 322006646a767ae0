//! Web Push Delivery
//!
//! `WebPushSender` encrypts and VAPID-signs the payload with the `web-push` crate, then
//! posts it over a shared `reqwest` client so connections to push services are pooled.

use super::types::{DeliveryOutcome, PushJob};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder,
};

/// Per-request timeout for outbound pushes.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Seconds a push service may hold an undeliverable message.
pub const PUSH_TTL_SECS: u32 = 3600;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to encode payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("failed to build push message: {0}")]
    Message(#[from] web_push::WebPushError),
    #[error("push request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, job: &PushJob) -> Result<DeliveryOutcome, PushError>;
}

/// VAPID signing material.
#[derive(Debug, Clone)]
pub struct VapidKeys {
    /// Base64url raw P-256 private key.
    pub private_key: String,
    /// `mailto:` contact placed in the `sub` claim.
    pub contact: String,
}

pub struct WebPushSender {
    client: reqwest::Client,
    vapid: Option<VapidKeys>,
}

impl WebPushSender {
    /// `vapid = None` disables delivery; jobs are reported as skipped.
    pub fn new(vapid: Option<VapidKeys>) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(PUSH_TIMEOUT).build()?;

        if vapid.is_none() {
            tracing::warn!("No VAPID private key configured; push delivery disabled");
        }

        Ok(Self { client, vapid })
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, job: &PushJob) -> Result<DeliveryOutcome, PushError> {
        let Some(vapid) = &self.vapid else {
            return Ok(DeliveryOutcome::Skipped);
        };

        let subscription = &job.subscription;
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_base64(&vapid.private_key, web_push::URL_SAFE_NO_PAD, &info)?;
        signature.add_claim("sub", format!("mailto:{}", vapid.contact));

        let body = serde_json::to_vec(&job.payload)?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(PUSH_TTL_SECS);
        builder.set_payload(ContentEncoding::Aes128Gcm, &body);
        builder.set_vapid_signature(signature.build()?);

        let request = web_push::request_builder::build_request::<Vec<u8>>(builder.build()?);

        let mut outbound = self.client.post(request.uri().to_string());
        for (name, value) in request.headers() {
            outbound = outbound.header(name.as_str(), value.as_bytes());
        }

        let response = outbound.body(request.into_body()).send().await?;
        let status = response.status().as_u16();

        Ok(match status {
            200..=299 => DeliveryOutcome::Delivered,
            410 => DeliveryOutcome::Gone,
            other => DeliveryOutcome::Rejected(other),
        })
    }
}
