use crate::schedule::types::{Category, Day};

use serde::{Deserialize, Serialize};

/// Icon shown by the browser for every notification.
pub const NOTIFICATION_ICON: &str = "/icons/icon-192x192.png";

/// Maximum accepted length of a push endpoint URL.
pub const MAX_ENDPOINT_LEN: usize = 2048;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser push subscription owned by one member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushSubscription {
    pub subject_id: String,
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// JSON document delivered to the service worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: serde_json::Value,
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: NOTIFICATION_ICON.to_string(),
            data,
        }
    }

    /// A confirmed seat in `category` was released.
    pub fn vacancy(category: Category) -> Self {
        Self::new(
            "Spot available",
            format!("A confirmed spot just opened up in {}.", category.label()),
            serde_json::json!({ "kind": "vacancy", "category": category }),
        )
    }

    /// The capacity for `day` was confirmed for the first time this week.
    pub fn capacity_confirmed(day: Day, capacity: u32) -> Self {
        let name = match day {
            Day::Wed => "Wednesday",
            Day::Fri => "Friday",
        };
        Self::new(
            "Capacity confirmed",
            format!("{} capacity is set to {}. Check whether you made the list.", name, capacity),
            serde_json::json!({ "kind": "capacity", "day": day }),
        )
    }
}

/// One delivery attempt: a payload for a single subscription.
#[derive(Debug, Clone)]
pub struct PushJob {
    pub subscription: PushSubscription,
    pub payload: PushPayload,
}

/// Result of a single delivery attempt that reached a conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service reported the subscription as gone (HTTP 410).
    Gone,
    /// Any other non-success status.
    Rejected(u16),
    /// Delivery is disabled (no signing key configured).
    Skipped,
}
