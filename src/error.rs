//! Error handling

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::risk::RiskError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Caller errors
    InvalidRequest(String),
    NotFound(String),

    // Upstream errors
    DataUnavailable(String),
    ModelUnavailable(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::NotFound(_) => "not_found",
            AppError::DataUnavailable(_) => "data_unavailable",
            AppError::ModelUnavailable(_) => "model_unavailable",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_message) = match &self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::DataUnavailable(msg) => {
                tracing::warn!("Data unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Statistics data unavailable")
            }
            AppError::ModelUnavailable(msg) => {
                tracing::warn!("Model unavailable: {}", msg);
                (StatusCode::BAD_GATEWAY, "Prediction model unavailable")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<RiskError> for AppError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            RiskError::DataUnavailable(msg) => AppError::DataUnavailable(msg),
            RiskError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}
