//! Insight Ranker
//!
//! Runs a fixed list of heuristics over one snapshot and orders the
//! findings by priority. Findings of equal priority keep heuristic order.

use serde::{Deserialize, Serialize};

use super::classifier::classify;
use super::store::{AggregationStore, Snapshot};
use super::summary::{elderly_delta, highest, largest_monthly_increase};
use super::types::{Dimension, FilterCriteria, Insight, InsightType, Priority, RiskTier};

/// Tunable severity thresholds, in percentage points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Elderly delta at or above this is High priority
    pub elderly_delta_high: f64,
    /// Month-over-month rise above this is a warning instead of info
    pub seasonal_spike_warning: f64,
    /// Upper bound on returned insights
    pub max_insights: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            elderly_delta_high: 5.0,
            seasonal_spike_warning: 3.0,
            max_insights: 10,
        }
    }
}

pub struct InsightRanker {
    config: InsightConfig,
}

impl InsightRanker {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Ranked insights for the store's current snapshot
    pub fn rank(&self, store: &AggregationStore) -> Vec<Insight> {
        match store.snapshot() {
            Some(snapshot) => self.rank_snapshot(&snapshot),
            None => Vec::new(),
        }
    }

    pub fn rank_snapshot(&self, snapshot: &Snapshot) -> Vec<Insight> {
        let mut insights: Vec<Insight> = [
            self.worst_region(snapshot),
            self.elderly_gap(snapshot),
            self.worst_device(snapshot),
            self.seasonal_spike(snapshot),
        ]
        .into_iter()
        .flatten()
        .collect();

        // stable: equal priorities keep heuristic order
        insights.sort_by_key(|i| i.priority);
        insights.truncate(self.config.max_insights);
        insights
    }

    fn worst_region(&self, snapshot: &Snapshot) -> Option<Insight> {
        let region = highest(snapshot.regional(&FilterCriteria::default()))?;
        let tier = classify(region.failure_rate);
        let (kind, priority) = if tier == RiskTier::Critical {
            (InsightType::Critical, Priority::High)
        } else {
            (InsightType::Warning, Priority::Medium)
        };

        Some(Insight {
            kind,
            title: format!("High Risk Zone: {}", region.dimension_key),
            description: format!(
                "{} shows a {:.1}% failure rate across {} attempts ({} risk). Investigate environmental factors, device quality, or user demographics.",
                region.dimension_key, region.failure_rate, region.total_attempts, tier
            ),
            priority,
        })
    }

    fn elderly_gap(&self, snapshot: &Snapshot) -> Option<Insight> {
        let gap = elderly_delta(snapshot.dimension(Dimension::AgeGroup))?;
        if gap.delta <= 0.0 {
            return None;
        }
        let priority = if gap.delta >= self.config.elderly_delta_high {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(Insight {
            kind: InsightType::Warning,
            title: "Elderly Users Fail More Often".to_string(),
            description: format!(
                "Elderly users fail {:.1}% of attempts versus {:.1}% for other age groups (+{:.1} points). Consider promoting iris authentication or assisted capture.",
                gap.elderly_rate, gap.others_rate, gap.delta
            ),
            priority,
        })
    }

    fn worst_device(&self, snapshot: &Snapshot) -> Option<Insight> {
        let device = highest(snapshot.dimension(Dimension::Device))?;
        Some(Insight {
            kind: InsightType::Warning,
            title: format!("Device Model {} Underperforming", device.dimension_key),
            description: format!(
                "Device model {} has the highest failure rate ({:.1}% over {} attempts). Recommend replacement or firmware update.",
                device.dimension_key, device.failure_rate, device.total_attempts
            ),
            priority: Priority::Medium,
        })
    }

    fn seasonal_spike(&self, snapshot: &Snapshot) -> Option<Insight> {
        let step = largest_monthly_increase(snapshot.dimension(Dimension::Month))?;
        let (kind, priority) = if step.increase > self.config.seasonal_spike_warning {
            (InsightType::Warning, Priority::Medium)
        } else {
            (InsightType::Info, Priority::Low)
        };

        Some(Insight {
            kind,
            title: format!("Seasonal Spike in {}", step.to.dimension_key),
            description: format!(
                "Failure rate rose from {:.1}% in {} to {:.1}% in {} (+{:.1} points). Plan seasonal awareness campaigns.",
                step.from.failure_rate,
                step.from.dimension_key,
                step.to.failure_rate,
                step.to.dimension_key,
                step.increase
            ),
            priority,
        })
    }
}

impl Default for InsightRanker {
    fn default() -> Self {
        Self::new(InsightConfig::default())
    }
}
