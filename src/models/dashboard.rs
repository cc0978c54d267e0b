//! Dashboard request/response records

use serde::{Deserialize, Serialize};

use crate::risk::{
    Dimension, FailureStatistic, FeatureImportance, FilterCriteria, Insight, Kpis,
    RefreshOutcome, RiskError, SnapshotStatus, TieredStatistic,
};

/// Query string of the risk-zone view. Blank values mean unset.
#[derive(Debug, Deserialize, Default)]
pub struct ZoneFilter {
    pub biometric_type: Option<String>,
    pub age_group: Option<String>,
}

impl TryFrom<ZoneFilter> for FilterCriteria {
    type Error = RiskError;

    fn try_from(query: ZoneFilter) -> Result<Self, Self::Error> {
        FilterCriteria::from_optional(query.biometric_type.as_deref(), query.age_group.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub filter: FilterCriteria,
    pub zones: Vec<TieredStatistic>,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    pub zone: TieredStatistic,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct DimensionResponse {
    pub dimension: Dimension,
    pub records: Vec<FailureStatistic>,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub monthly: Vec<FailureStatistic>,
    pub age_groups: Vec<FailureStatistic>,
    pub devices: Vec<FailureStatistic>,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct KpiResponse {
    #[serde(flatten)]
    pub kpis: Kpis,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct FeatureImportanceResponse {
    pub features: Vec<FeatureImportance>,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
    pub snapshot: SnapshotStatus,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(flatten)]
    pub outcome: RefreshOutcome,
    pub snapshot: SnapshotStatus,
}
