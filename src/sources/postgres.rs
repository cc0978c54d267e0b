//! Statistics feed over the attempt table

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::AttemptAggregate;
use crate::risk::{Dimension, FeedError, FeedRecord, FilterCriteria, StatisticsFeed};

pub struct PgStatisticsFeed {
    pool: PgPool,
    timeout: Duration,
}

impl PgStatisticsFeed {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<F>(&self, query: F) -> Result<Vec<FeedRecord>, FeedError>
    where
        F: Future<Output = Result<Vec<AttemptAggregate>, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(rows)) => Ok(rows.into_iter().map(FeedRecord::from).collect()),
            Ok(Err(e)) => Err(FeedError::Unavailable(e.to_string())),
            Err(_) => Err(FeedError::Timeout),
        }
    }
}

#[async_trait]
impl StatisticsFeed for PgStatisticsFeed {
    async fn fetch_regional(&self, filter: &FilterCriteria) -> Result<Vec<FeedRecord>, FeedError> {
        self.bounded(AttemptAggregate::by_state(&self.pool, filter)).await
    }

    async fn fetch_by_dimension(&self, dimension: Dimension) -> Result<Vec<FeedRecord>, FeedError> {
        self.bounded(AttemptAggregate::by_dimension(&self.pool, dimension)).await
    }
}
