//! Caller Identity
//!
//! Authentication happens upstream; the proxy forwards the verified member in request
//! headers. Handlers take `Identity` (required) or `Option<Identity>` as an extractor.

use super::protocol::StatusResponse;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_NAME: &str = "x-user-name";
pub const HEADER_USER_ROLE: &str = "x-user-role";

pub const ROLE_MANAGER: &str = "manager";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl Identity {
    pub fn member(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: "member".to_string(),
        }
    }

    pub fn manager(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: ROLE_MANAGER.to_string(),
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role == ROLE_MANAGER
    }

    /// Reads the identity headers. `None` when the id header is absent or blank.
    pub fn from_parts(parts: &Parts) -> Option<Self> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = header(HEADER_USER_ID)?;
        Some(Self {
            name: header(HEADER_USER_NAME).unwrap_or_else(|| id.clone()),
            role: header(HEADER_USER_ROLE).unwrap_or_else(|| "member".to_string()),
            id,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<StatusResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(StatusResponse::failure("unauthenticated", "missing identity")),
            )
        })
    }
}
