use crate::schedule::types::Status;

use axum::http::StatusCode;
use thiserror::Error;

/// Business outcomes of a registration request. None of these is a fault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("unknown category '{0}'")]
    InvalidCategory(String),
    #[error("not allowed while the category is {status:?}")]
    WindowViolation { status: Status },
    #[error("already registered in this category")]
    DuplicateClaim,
    #[error("nothing to release")]
    NotFound,
    #[error("too many requests, slow down")]
    RateLimited,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("missing identity")]
    Unauthenticated,
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::InvalidCategory(_) | GateError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GateError::WindowViolation { .. } | GateError::Forbidden(_) => StatusCode::FORBIDDEN,
            GateError::DuplicateClaim => StatusCode::CONFLICT,
            GateError::NotFound => StatusCode::NOT_FOUND,
            GateError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GateError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::InvalidCategory(_) => "invalid_category",
            GateError::WindowViolation { .. } => "window_violation",
            GateError::DuplicateClaim => "duplicate_claim",
            GateError::NotFound => "not_found",
            GateError::RateLimited => "rate_limited",
            GateError::Forbidden(_) => "forbidden",
            GateError::BadRequest(_) => "bad_request",
            GateError::Unauthenticated => "unauthenticated",
        }
    }
}
