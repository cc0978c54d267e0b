//! Aggregate statistics handlers

use axum::{
    extract::{rejection::PathRejection, State, Path},
    Json,
};

use crate::{AppState, AppResult};
use crate::models::{DimensionResponse, FeatureImportanceResponse, KpiResponse, TrendsResponse};
use crate::risk::{feature_importance, Dimension, Kpis};

/// All records along one axis
pub async fn by_dimension(
    State(state): State<AppState>,
    dimension: Result<Path<String>, PathRejection>,
) -> AppResult<Json<DimensionResponse>> {
    let Path(dimension) = dimension?;
    let dimension: Dimension = dimension.parse()?;
    let (current, snapshot) = state.store.view();

    Ok(Json(DimensionResponse {
        dimension,
        records: current
            .map(|s| s.dimension(dimension).to_vec())
            .unwrap_or_default(),
        snapshot,
    }))
}

/// Monthly, age-group and device series in one response
pub async fn trends(State(state): State<AppState>) -> Json<TrendsResponse> {
    let (current, snapshot) = state.store.view();
    let series = |dimension: Dimension| {
        current
            .as_ref()
            .map(|s| s.dimension(dimension).to_vec())
            .unwrap_or_default()
    };

    Json(TrendsResponse {
        monthly: series(Dimension::Month),
        age_groups: series(Dimension::AgeGroup),
        devices: series(Dimension::Device),
        snapshot,
    })
}

/// Headline figures
pub async fn kpis(State(state): State<AppState>) -> Json<KpiResponse> {
    let (current, snapshot) = state.store.view();

    Json(KpiResponse {
        kpis: current.map(|s| Kpis::from_snapshot(&s)).unwrap_or_default(),
        snapshot,
    })
}

/// Worst failure rate per request feature
pub async fn features(State(state): State<AppState>) -> Json<FeatureImportanceResponse> {
    let (current, snapshot) = state.store.view();

    Json(FeatureImportanceResponse {
        features: current.map(|s| feature_importance(&s)).unwrap_or_default(),
        snapshot,
    })
}
