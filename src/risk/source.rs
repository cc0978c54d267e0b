//! External collaborators
//!
//! The statistics feed and the scoring model are outside the engine.
//! The engine only sees these traits and validates what comes back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::types::{Dimension, FailureStatistic, FilterCriteria, PredictionRequest};

// ============================================================================
// STATISTICS FEED
// ============================================================================

/// Record as delivered by the feed. Not trusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeedRecord {
    #[validate(length(min = 1))]
    pub dimension_key: String,
    #[validate(range(min = 0))]
    pub total_attempts: i64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub failure_rate: f64,
}

impl FeedRecord {
    pub fn new(dimension_key: impl Into<String>, total_attempts: i64, failure_rate: f64) -> Self {
        Self {
            dimension_key: dimension_key.into(),
            total_attempts,
            failure_rate,
        }
    }

    /// Validate and convert. Returns the reason on rejection.
    pub fn into_statistic(self) -> Result<FailureStatistic, String> {
        if self.dimension_key.trim().is_empty() {
            return Err("blank dimension_key".to_string());
        }
        if !self.failure_rate.is_finite() {
            return Err(format!("non-finite failure_rate for '{}'", self.dimension_key));
        }
        self.validate()
            .map_err(|e| format!("'{}': {}", self.dimension_key, e))?;

        Ok(FailureStatistic {
            dimension_key: self.dimension_key.trim().to_string(),
            total_attempts: self.total_attempts as u64,
            failure_rate: self.failure_rate,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),
    #[error("feed timed out")]
    Timeout,
}

/// Source of aggregate failure statistics
#[async_trait]
pub trait StatisticsFeed: Send + Sync {
    /// Per-region statistics under the given filter
    async fn fetch_regional(&self, filter: &FilterCriteria) -> Result<Vec<FeedRecord>, FeedError>;

    /// All statistics along one axis, unfiltered
    async fn fetch_by_dimension(&self, dimension: Dimension) -> Result<Vec<FeedRecord>, FeedError>;
}

// ============================================================================
// SCORING MODEL
// ============================================================================

/// Raw model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelScore {
    /// Percentage, 0-100
    #[validate(range(min = 0.0, max = 100.0))]
    pub probability: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[serde(default)]
    pub factors: BTreeMap<String, f64>,
}

impl ModelScore {
    pub fn new(probability: f64, confidence: f64) -> Self {
        Self {
            probability,
            confidence,
            factors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model timed out")]
    Timeout,
}

/// Failure-probability model
#[async_trait]
pub trait ModelScorer: Send + Sync {
    async fn score(&self, request: &PredictionRequest) -> Result<ModelScore, ScoreError>;
}
