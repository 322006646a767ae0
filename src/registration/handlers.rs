use super::identity::Identity;
use super::protocol::*;
use super::service::Gatekeeper;
use crate::ratelimit::limiter::client_key;

use axum::{
    Extension, Json,
    extract::{ConnectInfo, Query},
    http::StatusCode,
};
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn handle_claim(
    Extension(gate): Extension<Arc<Gatekeeper>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    identity: Identity,
    Json(req): Json<ClaimRequest>,
) -> (StatusCode, Json<StatusResponse>) {
    let key = client_key("register", Some(&identity.id), Some(addr.ip()));

    match gate.claim(&identity, &key, &req) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(
                StatusResponse::ok(format!("Registered for {}", outcome.category))
                    .with_position(outcome.position),
            ),
        ),
        Err(e) => {
            tracing::debug!("Claim by {} rejected: {}", identity.id, e);
            (e.status_code(), Json(StatusResponse::from(&e)))
        }
    }
}

pub async fn handle_release(
    Extension(gate): Extension<Arc<Gatekeeper>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    identity: Identity,
    Json(req): Json<ReleaseRequest>,
) -> (StatusCode, Json<StatusResponse>) {
    let key = client_key("register", Some(&identity.id), Some(addr.ip()));

    match gate.release(&identity, &key, &req) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(StatusResponse::ok(format!(
                "Released {} from {}",
                outcome.released.entry.display_name, outcome.category
            ))),
        ),
        Err(e) => {
            tracing::debug!("Release by {} rejected: {}", identity.id, e);
            (e.status_code(), Json(StatusResponse::from(&e)))
        }
    }
}

pub async fn handle_board(
    Extension(gate): Extension<Arc<Gatekeeper>>,
    identity: Option<Identity>,
    Query(query): Query<BoardQuery>,
) -> (StatusCode, Json<BoardResponse>) {
    let privileged = identity.as_ref().is_some_and(Identity::is_manager);

    match gate.board(query.category.as_deref(), privileged) {
        Ok(categories) => (
            StatusCode::OK,
            Json(BoardResponse {
                success: true,
                code: None,
                categories,
            }),
        ),
        Err(e) => (
            e.status_code(),
            Json(BoardResponse {
                success: false,
                code: Some(e.code().to_string()),
                categories: Vec::new(),
            }),
        ),
    }
}

pub async fn handle_category_states(
    Extension(gate): Extension<Arc<Gatekeeper>>,
) -> (StatusCode, Json<CategoryStatesResponse>) {
    (
        StatusCode::OK,
        Json(CategoryStatesResponse {
            categories: gate.category_states(),
        }),
    )
}
