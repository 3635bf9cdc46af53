//! Health check endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ServerState;
use crate::health::HealthState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Liveness probe plus camera connection state
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let HealthState {
        connected,
        last_error,
    } = state.health.snapshot();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        connected,
        last_error: last_error.map(|e| e.message),
    })
}

#[must_use]
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}
