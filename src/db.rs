//! Database module - PostgreSQL connection and attempt-record table

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Make sure the attempt-record table exists
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- One row per biometric authentication attempt
CREATE TABLE IF NOT EXISTS auth_attempts (
    id BIGSERIAL PRIMARY KEY,
    auth_timestamp TIMESTAMPTZ NOT NULL,
    state VARCHAR(64) NOT NULL,
    district VARCHAR(128),
    age_group VARCHAR(16) NOT NULL,
    gender VARCHAR(16),
    biometric_type VARCHAR(16) NOT NULL,
    device_model VARCHAR(64) NOT NULL,
    auth_result VARCHAR(16) NOT NULL,
    failure_reason VARCHAR(64),
    attempt_count INT DEFAULT 1
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_attempts_state ON auth_attempts(state);
CREATE INDEX IF NOT EXISTS idx_attempts_timestamp ON auth_attempts(auth_timestamp);
CREATE INDEX IF NOT EXISTS idx_attempts_segment
    ON auth_attempts(age_group, biometric_type, device_model, state);
"#;
