use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringConfig;

/// Toxicity scores returned by the analysis API. Fields the service omits
/// default to 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ScoreResult {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub toxicity: f64,
    #[serde(default)]
    pub obscene: f64,
}

/// Why a scoring call produced no result. Never fatal to the caller: the
/// pipeline treats every kind as "allow the message and log a warning".
#[derive(Debug, thiserror::Error)]
pub enum ScoringFailure {
    #[error("scoring request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bad response from scoring API: {0}")]
    BadResponse(String),
    #[error("unexpected scoring error: {0}")]
    Unexpected(String),
}

/// Anything that can score a piece of text. The pipeline depends on this
/// seam so tests can script results without a network.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, text: &str) -> std::result::Result<ScoreResult, ScoringFailure>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    result: ScoreResult,
}

/// Client for the external toxicity-scoring service.
///
/// One POST per call, no retries; retry policy (there is none) belongs to the
/// orchestrator. The reqwest client is built once with the configured timeout
/// and reused across calls.
pub struct ScoringClient {
    client: reqwest::Client,
    config: ScoringConfig,
}

impl ScoringClient {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for scoring API")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Scorer for ScoringClient {
    async fn score(&self, text: &str) -> std::result::Result<ScoreResult, ScoringFailure> {
        debug!("Sending text to scoring API: {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringFailure::BadResponse(format!(
                "status {}: {}",
                status, body
            )));
        }

        let analyzed: AnalyzeResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ScoringFailure::Timeout
            } else {
                ScoringFailure::BadResponse(format!("undecodable body: {}", e))
            }
        })?;

        Ok(analyzed.result)
    }
}

fn classify_send_error(err: reqwest::Error) -> ScoringFailure {
    if err.is_timeout() {
        ScoringFailure::Timeout
    } else if err.is_connect() || err.is_request() {
        ScoringFailure::Transport(err.to_string())
    } else {
        ScoringFailure::Unexpected(err.to_string())
    }
}
