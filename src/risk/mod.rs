//! Risk Engine
//!
//! Turns aggregate failure statistics into risk tiers, filtered views,
//! point predictions and ranked insights.
//!
//! ```text
//! StatisticsFeed ──► AggregationStore ──► InsightRanker
//!                          │
//!                          ▼
//!                    RiskClassifier ◄── PredictionService ◄── ModelScorer
//! ```

pub mod classifier;
pub mod error;
pub mod insights;
pub mod prediction;
pub mod source;
pub mod store;
pub mod summary;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{annotate, classify, classify_prediction};
pub use error::RiskError;
pub use insights::{InsightConfig, InsightRanker};
pub use prediction::PredictionService;
pub use source::{FeedError, FeedRecord, ModelScore, ModelScorer, ScoreError, StatisticsFeed};
pub use store::{AggregationStore, RefreshOutcome, Snapshot, SnapshotStatus};
pub use summary::{feature_importance, FeatureImportance, Kpis};
pub use types::*;
