//! Registration HTTP Protocol
//!
//! Endpoint paths and the JSON bodies exchanged with the browser client.

use super::error::GateError;
use crate::schedule::types::{Category, Status};

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_CLAIM: &str = "/api/claim";
pub const ENDPOINT_RELEASE: &str = "/api/release";
/// Board with entries; `?category=` narrows it to one category.
pub const ENDPOINT_BOARD: &str = "/api/board";
pub const ENDPOINT_CATEGORY_STATES: &str = "/api/category-states";

// --- Data Transfer Objects ---

/// Subject a manager claims on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimTarget {
    pub subject_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub category: String,
    /// Required for guest categories, optional for leftover categories.
    #[serde(default)]
    pub guest_name: Option<String>,
    /// Managers only.
    #[serde(default)]
    pub target: Option<ClaimTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub category: String,
    /// For managers, the member (or guest holder) to release. For members, one of
    /// their own guest entries.
    #[serde(default)]
    pub target_subject_id: Option<String>,
}

/// Generic acknowledgment for mutating requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    /// Position of the new entry after a successful claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: None,
            message: message.into(),
            position: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code.to_string()),
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl From<&GateError> for StatusResponse {
    fn from(error: &GateError) -> Self {
        Self::failure(error.code(), error.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardEntryView {
    pub position: usize,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    /// `"member"` or `"guest"`.
    pub kind: String,
    pub claimed_at: f64,
    /// Only present for managers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryBoard {
    pub category: Category,
    pub status: Status,
    /// Unix milliseconds of the next status change.
    pub deadline_ms: i64,
    pub entries: Vec<BoardEntryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub categories: Vec<CategoryBoard>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryState {
    pub category: Category,
    pub status: Status,
    pub next_status: Status,
    pub deadline_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStatesResponse {
    pub categories: Vec<CategoryState>,
}
