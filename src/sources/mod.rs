//! Collaborator adapters
//!
//! Concrete statistics feed and scoring models behind the engine's traits.

pub mod historical;
pub mod http_model;
pub mod postgres;

pub use historical::HistoricalScorer;
pub use http_model::{HttpModelScorer, ModelServiceConfig};
pub use postgres::PgStatisticsFeed;
