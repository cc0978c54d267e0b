//! Risk Classifier
//!
//! Maps a failure-rate percentage to a risk tier.
//! Thresholds are half-open with an inclusive lower bound.

use super::types::{FailureStatistic, RiskTier, TieredStatistic};

/// Lower bound of the Medium tier (percent)
pub const MEDIUM_MIN: f64 = 10.0;
/// Lower bound of the High tier (percent)
pub const HIGH_MIN: f64 = 20.0;
/// Lower bound of the Critical tier (percent)
pub const CRITICAL_MIN: f64 = 30.0;

/// Classify a failure rate. Total over `[0, inf)`; rates above 100 still
/// classify as Critical.
pub fn classify(failure_rate: f64) -> RiskTier {
    if failure_rate >= CRITICAL_MIN {
        RiskTier::Critical
    } else if failure_rate >= HIGH_MIN {
        RiskTier::High
    } else if failure_rate >= MEDIUM_MIN {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Tier of a predicted probability. Predictions use the same boundaries
/// but stop at High; Critical is reserved for observed aggregates.
pub fn classify_prediction(probability: f64) -> RiskTier {
    classify(probability).min(RiskTier::High)
}

/// Attach tier and color to a statistic
pub fn annotate(statistic: &FailureStatistic) -> TieredStatistic {
    let risk_level = classify(statistic.failure_rate);
    TieredStatistic {
        statistic: statistic.clone(),
        risk_level,
        color: risk_level.color(),
    }
}
