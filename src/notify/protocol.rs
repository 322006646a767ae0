//! Notification HTTP Protocol

use super::types::SubscriptionKeys;
use crate::schedule::types::Category;

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_VAPID_PUBLIC_KEY: &str = "/api/vapid-public-key";
pub const ENDPOINT_SUBSCRIBE: &str = "/api/notifications/subscribe";
pub const ENDPOINT_TOGGLE: &str = "/api/notifications/toggle";
pub const ENDPOINT_STATUS: &str = "/api/notifications/status";

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidKeyResponse {
    pub public_key: String,
}

/// Browser `PushSubscription.toJSON()` shape (extra fields are ignored).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub subscription: BrowserSubscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub category: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NotifyResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStatusResponse {
    pub wed_confirmed: bool,
    pub fri_confirmed: bool,
    pub prefs: Vec<Category>,
}
