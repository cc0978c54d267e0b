//! Aggregation Store
//!
//! Owns the current snapshot of failure statistics and answers
//! queries over it. A snapshot is built completely off to the side and
//! swapped in under a short write lock, so readers always see one whole
//! snapshot and an abandoned refresh leaves nothing behind.
//!
//! Every refresh takes a ticket when it starts. A finished refresh is only
//! committed if no refresh with a later ticket has committed already, so a
//! slow refresh can never put older data back over newer data.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::classifier::annotate;
use super::error::RiskError;
use super::source::{FeedError, FeedRecord, StatisticsFeed};
use super::types::{Dimension, FailureStatistic, FilterCriteria, TieredStatistic};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable set of statistics from one committed refresh
#[derive(Debug)]
pub struct Snapshot {
    pub id: Uuid,
    pub version: u64,
    pub refreshed_at: DateTime<Utc>,
    pub fingerprint: String,
    pub discarded_records: usize,
    regional: BTreeMap<FilterCriteria, Vec<FailureStatistic>>,
    dimensions: BTreeMap<Dimension, Vec<FailureStatistic>>,
}

impl Snapshot {
    /// Regional records under a filter; empty when none were ingested
    pub fn regional(&self, filter: &FilterCriteria) -> &[FailureStatistic] {
        self.regional.get(filter).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records along one axis. Months are in chronological order,
    /// everything else is sorted by key.
    pub fn dimension(&self, dimension: Dimension) -> &[FailureStatistic] {
        self.dimensions.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Regional records under a filter, each with its tier
    pub fn tiered_regional(&self, filter: &FilterCriteria) -> Vec<TieredStatistic> {
        self.regional(filter).iter().map(annotate).collect()
    }

    /// Unfiltered record for one region; `None` when it has no data
    pub fn lookup(&self, region_name: &str) -> Option<TieredStatistic> {
        let name = region_name.trim();
        self.regional(&FilterCriteria::default())
            .iter()
            .find(|s| s.dimension_key == name)
            .map(annotate)
    }

    pub fn record_count(&self) -> usize {
        self.regional.values().map(Vec::len).sum::<usize>()
            + self.dimensions.values().map(Vec::len).sum::<usize>()
    }

    /// Fetch every view from the feed and build a snapshot.
    ///
    /// Any failed fetch fails the whole build, and so does a feed that
    /// delivers nothing at all. Invalid records are dropped; if none
    /// survive, the build fails.
    async fn collect(feed: &dyn StatisticsFeed, version: u64) -> Result<Self, RiskError> {
        let mut received = 0usize;
        let mut discarded = 0usize;

        let mut regional = BTreeMap::new();
        for filter in FilterCriteria::all_combinations() {
            let records = feed.fetch_regional(&filter).await.map_err(|e| unavailable(&e))?;
            received += records.len();
            let (kept, dropped) = sanitize(records, false, &format!("regional [{}]", filter));
            discarded += dropped;
            regional.insert(filter, kept);
        }

        let mut dimensions = BTreeMap::new();
        for &dimension in Dimension::ALL {
            let records = feed
                .fetch_by_dimension(dimension)
                .await
                .map_err(|e| unavailable(&e))?;
            received += records.len();
            let is_month = dimension == Dimension::Month;
            let (kept, dropped) = sanitize(records, is_month, dimension.as_str());
            discarded += dropped;
            dimensions.insert(dimension, kept);
        }

        if received == 0 {
            return Err(RiskError::DataUnavailable(
                "feed returned no records in any view".to_string(),
            ));
        }
        if received == discarded {
            return Err(RiskError::DataUnavailable(format!(
                "all {} records from the feed were malformed",
                received
            )));
        }

        let fingerprint = fingerprint(&regional, &dimensions);

        Ok(Self {
            id: Uuid::new_v4(),
            version,
            refreshed_at: Utc::now(),
            fingerprint,
            discarded_records: discarded,
            regional,
            dimensions,
        })
    }
}

/// Upstream detail goes to the log, not into the error
fn unavailable(err: &FeedError) -> RiskError {
    tracing::warn!("Statistics feed error: {}", err);
    match err {
        FeedError::Timeout => RiskError::DataUnavailable("statistics feed timed out".to_string()),
        FeedError::Unavailable(_) => {
            RiskError::DataUnavailable("statistics feed unavailable".to_string())
        }
    }
}

/// Drop invalid and duplicate records, normalize month keys and sort.
fn sanitize(records: Vec<FeedRecord>, months: bool, view: &str) -> (Vec<FailureStatistic>, usize) {
    let mut kept: Vec<(Option<NaiveDate>, FailureStatistic)> = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        let mut stat = match record.into_statistic() {
            Ok(stat) => stat,
            Err(reason) => {
                tracing::warn!(view, %reason, "Discarding malformed statistic");
                dropped += 1;
                continue;
            }
        };

        let month = if months {
            match parse_month(&stat.dimension_key) {
                Some(date) => {
                    stat.dimension_key = date.format("%Y-%m").to_string();
                    Some(date)
                }
                None => {
                    tracing::warn!(view, key = %stat.dimension_key, "Discarding statistic with bad month label");
                    dropped += 1;
                    continue;
                }
            }
        } else {
            None
        };

        if kept.iter().any(|(_, s)| s.dimension_key == stat.dimension_key) {
            tracing::warn!(view, key = %stat.dimension_key, "Discarding duplicate statistic");
            dropped += 1;
            continue;
        }
        kept.push((month, stat));
    }

    kept.sort_by(|(ma, a), (mb, b)| ma.cmp(mb).then_with(|| a.dimension_key.cmp(&b.dimension_key)));
    (kept.into_iter().map(|(_, s)| s).collect(), dropped)
}

/// Accepts `YYYY-MM` (and a full `YYYY-MM-DD` date)
fn parse_month(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(label, "%Y-%m-%d"))
        .ok()
}

fn fingerprint(
    regional: &BTreeMap<FilterCriteria, Vec<FailureStatistic>>,
    dimensions: &BTreeMap<Dimension, Vec<FailureStatistic>>,
) -> String {
    let mut hasher = Sha256::new();
    let mut absorb = |view: String, stats: &[FailureStatistic]| {
        hasher.update(view.as_bytes());
        for s in stats {
            hasher.update(s.dimension_key.as_bytes());
            hasher.update(s.total_attempts.to_le_bytes());
            hasher.update(s.failure_rate.to_bits().to_le_bytes());
        }
    };
    for (filter, stats) in regional {
        absorb(format!("regional:{}", filter), stats.as_slice());
    }
    for (dimension, stats) in dimensions {
        absorb(format!("dimension:{}", dimension), stats.as_slice());
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// STATUS
// ============================================================================

/// What a refresh did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Snapshot replaced
    Applied {
        version: u64,
        records: usize,
        discarded: usize,
    },
    /// A refresh issued later had already committed; result dropped
    Superseded { version: u64, current_version: u64 },
}

/// Freshness of the data the store is serving
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotStatus {
    pub loaded: bool,
    pub version: Option<u64>,
    pub snapshot_id: Option<Uuid>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub fingerprint: Option<String>,
    /// A refresh newer than the served snapshot failed
    pub stale: bool,
    pub last_error: Option<String>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct RefreshFailure {
    version: u64,
    message: String,
    at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    current: Option<Arc<Snapshot>>,
    failure: Option<RefreshFailure>,
}

impl StoreState {
    fn current_version(&self) -> u64 {
        self.current.as_ref().map_or(0, |s| s.version)
    }

    fn status(&self) -> SnapshotStatus {
        let current = self.current.as_ref();
        SnapshotStatus {
            loaded: current.is_some(),
            version: current.map(|s| s.version),
            snapshot_id: current.map(|s| s.id),
            refreshed_at: current.map(|s| s.refreshed_at),
            fingerprint: current.map(|s| s.fingerprint.clone()),
            stale: self.failure.is_some(),
            last_error: self.failure.as_ref().map(|f| f.message.clone()),
            last_failure_at: self.failure.as_ref().map(|f| f.at),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct AggregationStore {
    state: RwLock<StoreState>,
    tickets: AtomicU64,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with fresh data from the feed.
    ///
    /// On failure the previous snapshot stays in place and the store
    /// reports itself stale.
    pub async fn refresh(&self, feed: &dyn StatisticsFeed) -> Result<RefreshOutcome, RiskError> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(ticket, "Refreshing statistics snapshot");

        match Snapshot::collect(feed, ticket).await {
            Ok(snapshot) => Ok(self.commit(snapshot)),
            Err(err) => {
                self.record_failure(ticket, &err);
                Err(err)
            }
        }
    }

    fn commit(&self, snapshot: Snapshot) -> RefreshOutcome {
        let mut state = self.state.write();
        let current_version = state.current_version();

        if current_version > snapshot.version {
            tracing::debug!(
                version = snapshot.version,
                current_version,
                "Dropping superseded refresh"
            );
            return RefreshOutcome::Superseded {
                version: snapshot.version,
                current_version,
            };
        }

        let outcome = RefreshOutcome::Applied {
            version: snapshot.version,
            records: snapshot.record_count(),
            discarded: snapshot.discarded_records,
        };
        tracing::info!(
            version = snapshot.version,
            records = snapshot.record_count(),
            discarded = snapshot.discarded_records,
            fingerprint = %snapshot.fingerprint,
            "Statistics snapshot applied"
        );

        if state.failure.as_ref().is_some_and(|f| f.version <= snapshot.version) {
            state.failure = None;
        }
        state.current = Some(Arc::new(snapshot));
        outcome
    }

    fn record_failure(&self, ticket: u64, err: &RiskError) {
        let mut state = self.state.write();
        if state.current_version() > ticket {
            tracing::debug!(ticket, "Ignoring failure of superseded refresh: {}", err);
            return;
        }
        if state.failure.as_ref().is_some_and(|f| f.version > ticket) {
            return;
        }
        tracing::warn!(ticket, "Statistics refresh failed, keeping last snapshot: {}", err);
        state.failure = Some(RefreshFailure {
            version: ticket,
            message: err.to_string(),
            at: Utc::now(),
        });
    }

    /// Current snapshot, if any refresh has succeeded
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.read().current.clone()
    }

    pub fn status(&self) -> SnapshotStatus {
        self.state.read().status()
    }

    /// Current snapshot together with the status describing it, taken
    /// under one read lock
    pub fn view(&self) -> (Option<Arc<Snapshot>>, SnapshotStatus) {
        let state = self.state.read();
        (state.current.clone(), state.status())
    }

    /// One tiered record per region under the filter
    pub fn query_regional(&self, filter: &FilterCriteria) -> Vec<TieredStatistic> {
        self.snapshot()
            .map(|s| s.tiered_regional(filter))
            .unwrap_or_default()
    }

    /// Every record along an axis, independent of any filter
    pub fn query_by_dimension(&self, dimension: Dimension) -> Vec<FailureStatistic> {
        self.snapshot()
            .map(|s| s.dimension(dimension).to_vec())
            .unwrap_or_default()
    }

    /// Unfiltered record for one region; `None` when it has no data
    pub fn lookup(&self, region_name: &str) -> Option<TieredStatistic> {
        self.snapshot()?.lookup(region_name)
    }
}
