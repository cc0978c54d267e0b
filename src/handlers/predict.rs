//! Prediction handler

use axum::{extract::{rejection::JsonRejection, State}, Json};

use crate::{AppState, AppResult};
use crate::risk::{PredictionResult, RawPredictionRequest};

/// Predict failure probability for one feature combination
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawPredictionRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResult>> {
    let Json(req) = payload?;
    let result = state.predictor.predict_raw(req).await?;
    Ok(Json(result))
}
