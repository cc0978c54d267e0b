//! Insights handler

use axum::{extract::State, Json};

use crate::AppState;
use crate::models::InsightsResponse;

/// Ranked findings for the current snapshot
pub async fn list(State(state): State<AppState>) -> Json<InsightsResponse> {
    let (current, snapshot) = state.store.view();

    Json(InsightsResponse {
        insights: current
            .map(|s| state.ranker.rank_snapshot(&s))
            .unwrap_or_default(),
        snapshot,
    })
}
