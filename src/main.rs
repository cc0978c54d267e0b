//! Biometric Risk Server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biorisk_server::{
    config::Config,
    create_router, db, refresh_loop,
    risk::{AggregationStore, InsightRanker, ModelScorer, PredictionService, StatisticsFeed},
    sources::{HistoricalScorer, HttpModelScorer, ModelServiceConfig, PgStatisticsFeed},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let (plain, json) = if config.json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "biorisk_server=debug,tower_http=debug".into()))
        .with(plain)
        .with(json)
        .init();

    tracing::info!("Biometric Risk Server starting ({})...", config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    let feed: Arc<dyn StatisticsFeed> =
        Arc::new(PgStatisticsFeed::new(pool.clone(), config.feed_timeout));

    let scorer: Arc<dyn ModelScorer> = match &config.model_url {
        Some(url) => {
            tracing::info!("Scoring with model service at {}", url);
            Arc::new(HttpModelScorer::new(ModelServiceConfig {
                url: url.clone(),
                timeout: config.model_timeout,
            }).context("Failed to build model client")?)
        }
        None => {
            if config.is_production() {
                tracing::warn!("MODEL_URL not set, scoring from historical attempts");
            }
            Arc::new(HistoricalScorer::new(pool.clone(), config.model_timeout))
        }
    };

    // Build application state
    let store = Arc::new(AggregationStore::new());
    let state = AppState {
        store: store.clone(),
        feed: feed.clone(),
        predictor: Arc::new(PredictionService::new(scorer)),
        ranker: Arc::new(InsightRanker::new(config.insights.clone())),
        config: config.clone(),
    };

    // Start background refresh
    match config.refresh_interval() {
        Some(period) => {
            tokio::spawn(refresh_loop::run(store, feed, period));
        }
        None => {
            tracing::info!("Background refresh disabled, loading once");
            refresh_loop::refresh_once(&store, feed.as_ref()).await;
        }
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await
        .context("Server error")?;

    Ok(())
}
