//! Refresh handler

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::RefreshResponse;

/// Reload the statistics snapshot now
pub async fn trigger(State(state): State<AppState>) -> AppResult<Json<RefreshResponse>> {
    let outcome = state.store.refresh(state.feed.as_ref()).await?;

    Ok(Json(RefreshResponse {
        outcome,
        snapshot: state.store.status(),
    }))
}
