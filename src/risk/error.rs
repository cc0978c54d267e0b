//! Risk engine errors

use thiserror::Error;

/// Errors surfaced by the risk engine to its immediate caller.
///
/// An empty query result is not an error; it is an empty `Vec` or `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Malformed or out-of-domain input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The statistics feed could not produce a usable snapshot
    #[error("statistics unavailable: {0}")]
    DataUnavailable(String),

    /// The scoring model failed, timed out or returned garbage
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

impl RiskError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            RiskError::InvalidRequest(_) => "invalid_request",
            RiskError::DataUnavailable(_) => "data_unavailable",
            RiskError::ModelUnavailable(_) => "model_unavailable",
        }
    }
}
