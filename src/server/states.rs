//! State tree, snapshot and refresh endpoints

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;

use super::ServerState;
use crate::dispatch::Feature;
use crate::snapshot;
use crate::state::{StateEntry, StateValue};

/// Body of a host write
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub val: StateValue,
}

async fn list(State(state): State<Arc<ServerState>>) -> Json<BTreeMap<String, StateEntry>> {
    Json(state.store.entries().await)
}

async fn get_one(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<StateEntry>, StatusCode> {
    state
        .store
        .entry(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Record an unacknowledged write; the daemon dispatches it
async fn write(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(body): Json<WriteRequest>,
) -> Response {
    if Feature::from_state_id(&id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("{id} is not writable") })),
        )
            .into_response();
    }

    state.store.write(&id, body.val).await;
    StatusCode::ACCEPTED.into_response()
}

async fn take_snapshot(State(state): State<Arc<ServerState>>) -> Response {
    match snapshot::capture(&state.client).await {
        Ok(image) => Json(image).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "snapshot failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Request an immediate poll cycle
async fn refresh(State(state): State<Arc<ServerState>>) -> StatusCode {
    match state.refresh.try_send(()) {
        // A full queue means a cycle is already pending
        Ok(()) | Err(TrySendError::Full(())) => StatusCode::ACCEPTED,
        Err(TrySendError::Closed(())) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[must_use]
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/states", get(list))
        .route("/states/{id}", get(get_one).put(write))
        .route("/snapshot", post(take_snapshot))
        .route("/refresh", post(refresh))
        .with_state(state)
}
