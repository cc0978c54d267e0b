//! Model Service Client
//!
//! HTTP client for an external failure-probability model.

use std::time::Duration;

use async_trait::async_trait;

use crate::risk::{ModelScore, ModelScorer, PredictionRequest, ScoreError};

/// Model service configuration
#[derive(Debug, Clone)]
pub struct ModelServiceConfig {
    /// Full URL of the scoring endpoint
    pub url: String,
    pub timeout: Duration,
}

pub struct HttpModelScorer {
    config: ModelServiceConfig,
    http_client: reqwest::Client,
}

impl HttpModelScorer {
    pub fn new(config: ModelServiceConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http_client })
    }
}

#[async_trait]
impl ModelScorer for HttpModelScorer {
    async fn score(&self, request: &PredictionRequest) -> Result<ModelScore, ScoreError> {
        let response = self.http_client
            .post(&self.config.url)
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Model service returned {}: {}", status, error_text);
            return Err(ScoreError::Unavailable(format!("model service returned {}", status)));
        }

        response.json::<ModelScore>().await.map_err(|e| {
            if e.is_timeout() {
                ScoreError::Timeout
            } else {
                ScoreError::Unavailable(format!("unreadable model response: {}", e))
            }
        })
    }
}

fn classify_transport_error(err: reqwest::Error) -> ScoreError {
    if err.is_timeout() {
        ScoreError::Timeout
    } else {
        ScoreError::Unavailable(err.to_string())
    }
}
