//! Risk zone handlers

use axum::{
    extract::{rejection::{PathRejection, QueryRejection}, State, Path, Query},
    Json,
};

use crate::{AppState, AppResult, AppError};
use crate::models::{ZoneFilter, ZoneResponse, ZonesResponse};
use crate::risk::FilterCriteria;

/// Per-region failure rates under an optional filter
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ZoneFilter>, QueryRejection>,
) -> AppResult<Json<ZonesResponse>> {
    let Query(query) = query?;
    let filter = FilterCriteria::try_from(query)?;
    let (current, snapshot) = state.store.view();

    Ok(Json(ZonesResponse {
        filter,
        zones: current.map(|s| s.tiered_regional(&filter)).unwrap_or_default(),
        snapshot,
    }))
}

/// Single region, unfiltered
pub async fn get(
    State(state): State<AppState>,
    region: Result<Path<String>, PathRejection>,
) -> AppResult<Json<ZoneResponse>> {
    let Path(region) = region?;
    let (current, snapshot) = state.store.view();
    let zone = current
        .and_then(|s| s.lookup(&region))
        .ok_or_else(|| AppError::NotFound(format!("No statistics for region '{}'", region)))?;

    Ok(Json(ZoneResponse { zone, snapshot }))
}
