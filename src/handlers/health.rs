//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use crate::risk::SnapshotStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    snapshot: SnapshotStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.status();
    let status = match (snapshot.loaded, snapshot.stale) {
        (true, false) => "healthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        snapshot,
    })
}
