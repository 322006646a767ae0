use super::protocol::{CapacityResponse, SetCapacityRequest};
use super::service::CapacityAdmin;
use crate::registration::identity::Identity;

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_get_capacities(
    Extension(admin): Extension<Arc<CapacityAdmin>>,
) -> (StatusCode, Json<CapacityResponse>) {
    (StatusCode::OK, Json(CapacityResponse::of(admin.current())))
}

pub async fn handle_set_capacity(
    Extension(admin): Extension<Arc<CapacityAdmin>>,
    identity: Identity,
    Json(req): Json<SetCapacityRequest>,
) -> (StatusCode, Json<CapacityResponse>) {
    if !identity.is_manager() {
        tracing::warn!("Capacity change refused for non-manager {}", identity.id);
        let mut response = CapacityResponse::of(admin.current());
        response.success = false;
        response.message = Some("managers only".to_string());
        return (StatusCode::FORBIDDEN, Json(response));
    }

    if req.wed.is_none() && req.fri.is_none() {
        let mut response = CapacityResponse::of(admin.current());
        response.success = false;
        response.message = Some("no capacity given".to_string());
        return (StatusCode::BAD_REQUEST, Json(response));
    }

    let update = admin.set(req.into()).await;
    tracing::info!(
        "Capacities set by {}: wed={:?} fri={:?}",
        identity.id,
        update.capacities.wed,
        update.capacities.fri
    );

    let mut response = CapacityResponse::of(update.capacities);
    response.newly_confirmed = update.newly_confirmed;
    (StatusCode::OK, Json(response))
}
