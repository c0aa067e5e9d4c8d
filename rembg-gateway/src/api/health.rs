//! Liveness endpoints. Never authenticated.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rembg_common::{HealthResponse, RootResponse};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// GET / - Service banner.
async fn root() -> Json<RootResponse> {
    Json(RootResponse::running())
}

/// GET /health - Reports the outcome of the startup engine check.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.unavailable_reason() {
        None => (StatusCode::OK, Json(HealthResponse::healthy())),
        Some(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::degraded(reason)),
        ),
    }
}
