//! Background refresh
//!
//! Periodically reloads the statistics snapshot. A failed round leaves
//! the last good snapshot in place (reported stale) and waits for the
//! next tick; there is no retry in between.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::risk::{AggregationStore, RefreshOutcome, StatisticsFeed};

/// Run forever. The first refresh happens immediately.
pub async fn run(store: Arc<AggregationStore>, feed: Arc<dyn StatisticsFeed>, period: Duration) {
    tracing::info!("Refresh loop started (every {}s)", period.as_secs());

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh_once(&store, feed.as_ref()).await;
    }
}

/// One round; outcome is logged, never propagated
pub async fn refresh_once(store: &AggregationStore, feed: &dyn StatisticsFeed) {
    match store.refresh(feed).await {
        Ok(RefreshOutcome::Applied { version, records, .. }) => {
            tracing::debug!("Scheduled refresh applied v{} ({} records)", version, records);
        }
        Ok(RefreshOutcome::Superseded { version, current_version }) => {
            tracing::debug!("Scheduled refresh v{} superseded by v{}", version, current_version);
        }
        Err(e) => {
            tracing::warn!("Scheduled refresh failed: {}", e);
        }
    }
}
