//! Hit endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::app_state::AppState;

/// `GET /attack`: count one hit. Always answers `200 OK`.
pub async fn attack(State(app): State<AppState>) -> impl IntoResponse {
    app.counters().record_hit();
    (StatusCode::OK, "OK")
}
