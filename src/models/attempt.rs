//! Authentication attempt aggregates

use sqlx::{FromRow, PgPool};

use crate::risk::{Dimension, FeedRecord, FilterCriteria, PredictionRequest};

/// One grouped row of the attempt table
#[derive(Debug, Clone, FromRow)]
pub struct AttemptAggregate {
    pub dimension_key: String,
    pub total_attempts: i64,
    pub failure_rate: f64,
}

impl From<AttemptAggregate> for FeedRecord {
    fn from(row: AttemptAggregate) -> Self {
        FeedRecord::new(row.dimension_key, row.total_attempts, row.failure_rate)
    }
}

impl AttemptAggregate {
    /// Failure rate per state under a filter
    pub async fn by_state(pool: &PgPool, filter: &FilterCriteria) -> Result<Vec<Self>, sqlx::Error> {
        Self::grouped(pool, "state", filter).await
    }

    /// Failure rate along one axis, unfiltered
    pub async fn by_dimension(pool: &PgPool, dimension: Dimension) -> Result<Vec<Self>, sqlx::Error> {
        Self::grouped(pool, group_expression(dimension), &FilterCriteria::default()).await
    }

    async fn grouped(
        pool: &PgPool,
        key: &'static str,
        filter: &FilterCriteria,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {key} AS dimension_key,
                   COUNT(*) AS total_attempts,
                   ROUND(100.0 * COUNT(*) FILTER (WHERE auth_result = 'failure') / COUNT(*), 2)::FLOAT8 AS failure_rate
            FROM auth_attempts
            WHERE ($1::TEXT IS NULL OR biometric_type = $1)
              AND ($2::TEXT IS NULL OR age_group = $2)
            GROUP BY 1
            ORDER BY 1
            "#
        );

        sqlx::query_as::<_, AttemptAggregate>(&sql)
            .bind(filter.biometric_type.map(|b| b.as_str()))
            .bind(filter.age_group.map(|a| a.as_str()))
            .fetch_all(pool)
            .await
    }
}

/// Grouping expression for an axis. Fixed strings only.
fn group_expression(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Region => "state",
        Dimension::Device => "device_model",
        Dimension::AgeGroup => "age_group",
        Dimension::Month => "to_char(date_trunc('month', auth_timestamp), 'YYYY-MM')",
    }
}

/// Attempt and failure counts for a slice of the table
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct SegmentCounts {
    pub total: i64,
    pub failures: i64,
}

impl SegmentCounts {
    /// Counts for the exact feature combination of a request
    pub async fn for_request(pool: &PgPool, request: &PredictionRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SegmentCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE auth_result = 'failure') AS failures
            FROM auth_attempts
            WHERE age_group = $1 AND biometric_type = $2 AND device_model = $3 AND state = $4
            "#
        )
        .bind(request.age_group.as_str())
        .bind(request.biometric_type.as_str())
        .bind(request.device_model.as_str())
        .bind(request.region.as_str())
        .fetch_one(pool)
        .await
    }

    /// Counts over every recorded attempt
    pub async fn overall(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SegmentCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE auth_result = 'failure') AS failures
            FROM auth_attempts
            "#
        )
        .fetch_one(pool)
        .await
    }

    /// Failure percentage, `None` for an empty slice
    pub fn failure_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.failures as f64 / self.total as f64 * 100.0)
    }
}
