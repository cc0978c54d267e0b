//! Historical scorer
//!
//! Scores a request as the observed failure rate of its exact segment.
//! Empty segments fall back to the overall rate at low confidence.
//! Used when no model service is configured.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::SegmentCounts;
use crate::risk::{ModelScore, ModelScorer, PredictionRequest, ScoreError};

/// Confidence when falling back to the overall rate
const FALLBACK_CONFIDENCE: f64 = 0.5;
/// Confidence ceiling for large segments
const MAX_CONFIDENCE: f64 = 0.95;
/// Segment size at which confidence is halfway to the ceiling
const HALF_CONFIDENCE_SAMPLES: f64 = 100.0;

pub struct HistoricalScorer {
    pool: PgPool,
    timeout: Duration,
}

impl HistoricalScorer {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn lookup(&self, request: &PredictionRequest) -> Result<ModelScore, sqlx::Error> {
        let segment = SegmentCounts::for_request(&self.pool, request).await?;
        if let Some(rate) = segment.failure_rate() {
            return Ok(ModelScore::new(round2(rate), segment_confidence(segment.total)));
        }

        let overall = SegmentCounts::overall(&self.pool).await?;
        match overall.failure_rate() {
            Some(rate) => Ok(ModelScore::new(round2(rate), FALLBACK_CONFIDENCE)),
            None => Err(sqlx::Error::RowNotFound),
        }
    }
}

#[async_trait]
impl ModelScorer for HistoricalScorer {
    async fn score(&self, request: &PredictionRequest) -> Result<ModelScore, ScoreError> {
        match tokio::time::timeout(self.timeout, self.lookup(request)).await {
            Ok(Ok(score)) => Ok(score),
            Ok(Err(sqlx::Error::RowNotFound)) => Err(ScoreError::Unavailable(
                "no historical attempts recorded".to_string(),
            )),
            Ok(Err(e)) => Err(ScoreError::Unavailable(e.to_string())),
            Err(_) => Err(ScoreError::Timeout),
        }
    }
}

/// Grows from the fallback level towards the ceiling with sample size
fn segment_confidence(samples: i64) -> f64 {
    let n = samples.max(0) as f64;
    FALLBACK_CONFIDENCE + (MAX_CONFIDENCE - FALLBACK_CONFIDENCE) * n / (n + HALF_CONFIDENCE_SAMPLES)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
