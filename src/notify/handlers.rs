use super::prefs::WeeklyState;
use super::protocol::*;
use super::subscriptions::SubscriptionStore;
use super::types::{MAX_ENDPOINT_LEN, PushSubscription};
use crate::ratelimit::limiter::{RateLimiter, RatePolicy, client_key};
use crate::registration::identity::Identity;
use crate::schedule::types::{Category, Day};

use axum::{
    Extension, Json,
    extract::ConnectInfo,
    http::StatusCode,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state for the notification endpoints.
pub struct NotifyContext {
    pub vapid_public_key: String,
    pub weekly: Arc<WeeklyState>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub limiter: Arc<RateLimiter>,
    pub toggle_policy: RatePolicy,
}

pub async fn handle_vapid_public_key(
    Extension(ctx): Extension<Arc<NotifyContext>>,
) -> (StatusCode, Json<VapidKeyResponse>) {
    (
        StatusCode::OK,
        Json(VapidKeyResponse {
            public_key: ctx.vapid_public_key.clone(),
        }),
    )
}

pub async fn handle_subscribe(
    Extension(ctx): Extension<Arc<NotifyContext>>,
    identity: Identity,
    Json(req): Json<SubscribeRequest>,
) -> (StatusCode, Json<NotifyResponse>) {
    let BrowserSubscription { endpoint, keys } = req.subscription;
    let endpoint = endpoint.trim().to_string();

    if endpoint.is_empty() || endpoint.len() > MAX_ENDPOINT_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(NotifyResponse::failure("invalid endpoint")),
        );
    }
    if keys.p256dh.is_empty() || keys.auth.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(NotifyResponse::failure("missing subscription keys")),
        );
    }

    let subscription = PushSubscription {
        subject_id: identity.id.clone(),
        endpoint,
        keys,
    };

    match ctx.subscriptions.upsert(subscription).await {
        Ok(()) => {
            tracing::info!("Stored push subscription for {}", identity.id);
            (StatusCode::OK, Json(NotifyResponse::ok()))
        }
        Err(e) => {
            tracing::error!("Failed to store subscription for {}: {:#}", identity.id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(NotifyResponse::failure("could not save subscription")),
            )
        }
    }
}

pub async fn handle_toggle(
    Extension(ctx): Extension<Arc<NotifyContext>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    identity: Identity,
    Json(req): Json<ToggleRequest>,
) -> (StatusCode, Json<NotifyResponse>) {
    let key = client_key("toggle", Some(&identity.id), Some(addr.ip()));
    if !ctx.limiter.check(&key, &ctx.toggle_policy) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(NotifyResponse::failure("too many requests")),
        );
    }

    let category = match req.category.parse::<Category>() {
        Ok(category) if category.is_capacity_tracked() => category,
        Ok(category) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(NotifyResponse::failure(format!(
                    "{} has no vacancy alerts",
                    category
                ))),
            );
        }
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(NotifyResponse::failure(e.to_string())),
            );
        }
    };

    if !ctx.weekly.is_confirmed(category.day()) {
        return (
            StatusCode::CONFLICT,
            Json(NotifyResponse::failure("capacity not confirmed yet")),
        );
    }

    ctx.weekly.set_pref(&identity.id, category, req.enabled);
    tracing::debug!(
        "{} turned {} alerts for {}",
        identity.id,
        if req.enabled { "on" } else { "off" },
        category
    );

    (StatusCode::OK, Json(NotifyResponse::ok()))
}

pub async fn handle_notification_status(
    Extension(ctx): Extension<Arc<NotifyContext>>,
    identity: Identity,
) -> (StatusCode, Json<NotificationStatusResponse>) {
    (
        StatusCode::OK,
        Json(NotificationStatusResponse {
            wed_confirmed: ctx.weekly.is_confirmed(Day::Wed),
            fri_confirmed: ctx.weekly.is_confirmed(Day::Fri),
            prefs: ctx.weekly.prefs_for(&identity.id),
        }),
    )
}
