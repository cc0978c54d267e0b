//! Biometric Risk Server
//!
//! Serves biometric authentication failure risk for the monitoring
//! dashboard: risk tiers per region, aggregate views, point predictions
//! and ranked insights.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BIORISK SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │  API      │  │  Risk Engine     │  │  Refresh Loop    │ │
//! │  │  (Axum)   │─►│  store/predict/  │◄─│  (Background)    │ │
//! │  │           │  │  insights        │  │                  │ │
//! │  └───────────┘  └────────┬─────────┘  └──────────────────┘ │
//! │              ┌───────────┴───────────┐                     │
//! │              ▼                       ▼                     │
//! │       ┌─────────────┐        ┌───────────────┐             │
//! │       │ PostgreSQL  │        │ Model Service │             │
//! │       └─────────────┘        └───────────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod refresh_loop;
pub mod risk;
pub mod sources;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use risk::{AggregationStore, InsightRanker, PredictionService, StatisticsFeed};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AggregationStore>,
    pub feed: Arc<dyn StatisticsFeed>,
    pub predictor: Arc<PredictionService>,
    pub ranker: Arc<InsightRanker>,
    pub config: config::Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Regional views
        .route("/api/v1/risk-zones", get(handlers::zones::list))
        .route("/api/v1/risk-zones/:region", get(handlers::zones::get))

        // Axis views
        .route("/api/v1/statistics/:dimension", get(handlers::statistics::by_dimension))
        .route("/api/v1/trends", get(handlers::statistics::trends))
        .route("/api/v1/kpis", get(handlers::statistics::kpis))
        .route("/api/v1/feature-importance", get(handlers::statistics::features))

        // Insights and prediction
        .route("/api/v1/insights", get(handlers::insights::list))
        .route("/api/v1/predict", post(handlers::predict::predict))

        // Snapshot management
        .route("/api/v1/refresh", post(handlers::refresh::trigger));

    let cors = match state.config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("Ignoring invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::new().allow_origin(Any)
        }
        None => CorsLayer::new().allow_origin(Any),
    };

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors.allow_methods(Any).allow_headers(Any))
        .with_state(state)
}
