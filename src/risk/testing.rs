//! Test doubles for the external collaborators

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::source::{FeedError, FeedRecord, ModelScore, ModelScorer, ScoreError, StatisticsFeed};
use super::types::{Dimension, FilterCriteria, PredictionRequest};

/// Region records with a fixed attempt count
pub(crate) fn region_records(rates: &[(&str, f64)]) -> Vec<FeedRecord> {
    rates
        .iter()
        .map(|(name, rate)| FeedRecord::new(*name, 500, *rate))
        .collect()
}

#[derive(Default)]
struct Gate {
    started: Notify,
    release: Notify,
}

/// In-memory feed. Views that were not configured come back empty.
#[derive(Default)]
pub(crate) struct StubFeed {
    regional: BTreeMap<FilterCriteria, Vec<FeedRecord>>,
    dimensions: BTreeMap<Dimension, Vec<FeedRecord>>,
    failing: Option<Dimension>,
    gate: Option<Gate>,
}

impl StubFeed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn regional(mut self, filter: FilterCriteria, records: Vec<FeedRecord>) -> Self {
        self.regional.insert(filter, records);
        self
    }

    pub(crate) fn dimension(mut self, dimension: Dimension, records: Vec<FeedRecord>) -> Self {
        self.dimensions.insert(dimension, records);
        self
    }

    /// Fail with `Unavailable` when this axis is fetched
    pub(crate) fn failing_on(mut self, dimension: Dimension) -> Self {
        self.failing = Some(dimension);
        self
    }

    /// Block inside the month fetch until `release` is called
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Gate::default());
        self
    }

    pub(crate) async fn wait_started(&self) {
        if let Some(gate) = &self.gate {
            gate.started.notified().await;
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.release.notify_one();
        }
    }
}

#[async_trait]
impl StatisticsFeed for StubFeed {
    async fn fetch_regional(&self, filter: &FilterCriteria) -> Result<Vec<FeedRecord>, FeedError> {
        Ok(self.regional.get(filter).cloned().unwrap_or_default())
    }

    async fn fetch_by_dimension(&self, dimension: Dimension) -> Result<Vec<FeedRecord>, FeedError> {
        if dimension == Dimension::Month {
            if let Some(gate) = &self.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
        }
        if self.failing == Some(dimension) {
            return Err(FeedError::Unavailable("stub outage".to_string()));
        }
        Ok(self.dimensions.get(&dimension).cloned().unwrap_or_default())
    }
}

/// Scorer returning a fixed answer and counting calls
pub(crate) struct StubScorer {
    answer: Result<ModelScore, ScoreError>,
    calls: AtomicUsize,
}

impl StubScorer {
    pub(crate) fn returning(probability: f64, confidence: f64) -> Self {
        Self::with(Ok(ModelScore::new(probability, confidence)))
    }

    pub(crate) fn with(answer: Result<ModelScore, ScoreError>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelScorer for StubScorer {
    async fn score(&self, _request: &PredictionRequest) -> Result<ModelScore, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// A feed shaped like a year of national data
pub(crate) fn national_feed() -> StubFeed {
    StubFeed::new()
        .regional(
            FilterCriteria::default(),
            vec![
                FeedRecord::new("Bihar", 820, 31.4),
                FeedRecord::new("Delhi", 910, 17.9),
                FeedRecord::new("Kerala", 760, 12.3),
                FeedRecord::new("Rajasthan", 840, 27.6),
            ],
        )
        .dimension(
            Dimension::Region,
            vec![
                FeedRecord::new("Bihar", 820, 31.4),
                FeedRecord::new("Delhi", 910, 17.9),
            ],
        )
        .dimension(
            Dimension::Device,
            vec![
                FeedRecord::new("UIDAI_Device_A", 1200, 16.8),
                FeedRecord::new("UIDAI_Device_C", 1150, 26.2),
                FeedRecord::new("UIDAI_Device_E", 1180, 17.1),
            ],
        )
        .dimension(
            Dimension::AgeGroup,
            vec![
                FeedRecord::new("young", 900, 15.0),
                FeedRecord::new("adult", 1500, 19.0),
                FeedRecord::new("elderly", 600, 29.5),
            ],
        )
        .dimension(
            Dimension::Month,
            vec![
                FeedRecord::new("2025-09", 800, 18.0),
                FeedRecord::new("2025-10", 810, 19.0),
                FeedRecord::new("2025-11", 790, 24.5),
                FeedRecord::new("2025-12", 805, 25.0),
            ],
        )
}
