//! Axum router wiring.
//!
//! - `/attack`  : hit endpoint
//! - `/feed`    : WebSocket counter feed
//! - `/healthz`, `/readyz`, `/metrics` : operational endpoints

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/attack", get(transport::http::attack))
        .route("/feed", get(transport::ws::feed_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
