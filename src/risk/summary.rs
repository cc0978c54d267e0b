//! Snapshot summaries
//!
//! Headline numbers derived from one snapshot. Shared by the KPI view
//! and the insight heuristics.

use serde::Serialize;

use super::store::Snapshot;
use super::types::{AgeGroup, BiometricType, Dimension, FailureStatistic, FilterCriteria};

/// Record with the highest failure rate. Ties go to the first record.
pub(crate) fn highest(stats: &[FailureStatistic]) -> Option<&FailureStatistic> {
    stats.iter().fold(None, |best: Option<&FailureStatistic>, s| match best {
        Some(b) if b.failure_rate >= s.failure_rate => Some(b),
        _ => Some(s),
    })
}

/// Attempt-weighted failure rate. Falls back to the plain mean when no
/// attempt counts are known.
pub(crate) fn weighted_rate<'a, I>(stats: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a FailureStatistic>,
{
    let stats: Vec<&FailureStatistic> = stats.into_iter().collect();
    if stats.is_empty() {
        return None;
    }
    let attempts: u64 = stats.iter().map(|s| s.total_attempts).sum();
    if attempts == 0 {
        let sum: f64 = stats.iter().map(|s| s.failure_rate).sum();
        return Some(sum / stats.len() as f64);
    }
    let weighted: f64 = stats
        .iter()
        .map(|s| s.failure_rate * s.total_attempts as f64)
        .sum();
    Some(weighted / attempts as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ElderlyDelta {
    pub elderly_rate: f64,
    pub others_rate: f64,
    pub delta: f64,
}

/// Elderly failure rate against the attempt-weighted rate of every other
/// age group pooled together. One delta, not the largest pairwise gap.
pub(crate) fn elderly_delta(age_groups: &[FailureStatistic]) -> Option<ElderlyDelta> {
    let mut elderly = None;
    let mut others = Vec::new();
    for stat in age_groups {
        match stat.dimension_key.parse::<AgeGroup>() {
            Ok(AgeGroup::Elderly) => elderly = Some(stat),
            Ok(_) => others.push(stat),
            Err(_) => {}
        }
    }
    let elderly_rate = elderly?.failure_rate;
    let others_rate = weighted_rate(others)?;
    Some(ElderlyDelta {
        elderly_rate,
        others_rate,
        delta: elderly_rate - others_rate,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthStep<'a> {
    pub from: &'a FailureStatistic,
    pub to: &'a FailureStatistic,
    pub increase: f64,
}

/// Largest rise between consecutive months. Expects chronological order.
/// `None` when there are fewer than two months or the rate never rises.
pub(crate) fn largest_monthly_increase(months: &[FailureStatistic]) -> Option<MonthStep<'_>> {
    months
        .windows(2)
        .map(|pair| MonthStep {
            from: &pair[0],
            to: &pair[1],
            increase: pair[1].failure_rate - pair[0].failure_rate,
        })
        .filter(|step| step.increase > 0.0)
        .fold(None, |best: Option<MonthStep<'_>>, step| match best {
            Some(b) if b.increase >= step.increase => Some(b),
            _ => Some(step),
        })
}

/// Peak month relative to the mean month, in percent
pub(crate) fn seasonal_spike(months: &[FailureStatistic]) -> Option<f64> {
    let peak = highest(months)?.failure_rate;
    let mean = months.iter().map(|m| m.failure_rate).sum::<f64>() / months.len() as f64;
    if mean > 0.0 {
        Some((peak - mean) / mean * 100.0)
    } else {
        None
    }
}

// ============================================================================
// KPIS
// ============================================================================

/// Headline figures. A field is `None` when its data is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub overall_failure_rate: Option<f64>,
    pub highest_risk_region: Option<String>,
    pub worst_device: Option<String>,
    pub elderly_failure_delta: Option<f64>,
    pub seasonal_spike: Option<f64>,
}

impl Kpis {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let regions = snapshot.regional(&FilterCriteria::default());
        Self {
            overall_failure_rate: weighted_rate(regions),
            highest_risk_region: highest(regions).map(|s| s.dimension_key.clone()),
            worst_device: highest(snapshot.dimension(Dimension::Device))
                .map(|s| s.dimension_key.clone()),
            elderly_failure_delta: elderly_delta(snapshot.dimension(Dimension::AgeGroup))
                .map(|d| d.delta),
            seasonal_spike: seasonal_spike(snapshot.dimension(Dimension::Month)),
        }
    }
}

// ============================================================================
// FEATURE IMPORTANCE
// ============================================================================

/// How strongly one request feature separates failure rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub name: &'static str,
    /// Worst failure rate among the feature's values, in percent
    pub importance: f64,
}

/// Worst per-value failure rate for age group, biometric type and device
/// model, most important first. Features without data are left out.
pub fn feature_importance(snapshot: &Snapshot) -> Vec<FeatureImportance> {
    let biometric = BiometricType::ALL
        .iter()
        .filter_map(|&biometric_type| {
            let filter = FilterCriteria {
                biometric_type: Some(biometric_type),
                age_group: None,
            };
            weighted_rate(snapshot.regional(&filter))
        })
        .fold(None, |worst: Option<f64>, rate| Some(worst.map_or(rate, |w| w.max(rate))));

    let mut features: Vec<FeatureImportance> = [
        ("Age Group", highest(snapshot.dimension(Dimension::AgeGroup)).map(|s| s.failure_rate)),
        ("Biometric Type", biometric),
        ("Device Model", highest(snapshot.dimension(Dimension::Device)).map(|s| s.failure_rate)),
    ]
    .into_iter()
    .filter_map(|(name, rate)| rate.map(|importance| FeatureImportance { name, importance }))
    .collect();

    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    features
}
