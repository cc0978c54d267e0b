//! Prediction Service
//!
//! Stateless: score through the model, classify, compose.
//! A failed score is reported, never replaced by a made-up value.

use std::sync::Arc;

use validator::Validate;

use super::classifier::classify_prediction;
use super::error::RiskError;
use super::source::{ModelScorer, ScoreError};
use super::types::{PredictionRequest, PredictionResult, RawPredictionRequest};

pub struct PredictionService {
    scorer: Arc<dyn ModelScorer>,
}

impl PredictionService {
    pub fn new(scorer: Arc<dyn ModelScorer>) -> Self {
        Self { scorer }
    }

    /// Score one fully-typed request. One attempt, no retries.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, RiskError> {
        let score = self.scorer.score(request).await.map_err(|e| {
            tracing::warn!(?request, "Scoring failed: {}", e);
            match e {
                ScoreError::Timeout => RiskError::ModelUnavailable("scoring timed out".to_string()),
                ScoreError::Unavailable(msg) => RiskError::ModelUnavailable(msg),
            }
        })?;

        if !score.probability.is_finite() || !score.confidence.is_finite() {
            return Err(RiskError::ModelUnavailable(
                "model returned a non-finite score".to_string(),
            ));
        }
        score.validate().map_err(|e| {
            RiskError::ModelUnavailable(format!("model returned an out-of-range score: {}", e))
        })?;

        let result = PredictionResult {
            failure_probability: score.probability,
            risk_level: classify_prediction(score.probability),
            confidence: score.confidence,
            factors: score.factors,
        };
        tracing::debug!(
            ?request,
            probability = result.failure_probability,
            tier = %result.risk_level,
            "Prediction scored"
        );
        Ok(result)
    }

    /// Check a caller-supplied request against the closed domains, then score it
    pub async fn predict_raw(&self, raw: RawPredictionRequest) -> Result<PredictionResult, RiskError> {
        let request = PredictionRequest::try_from(raw)?;
        self.predict(&request).await
    }
}
