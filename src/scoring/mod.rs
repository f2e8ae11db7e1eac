//! Scoring backend client
//!
//! Fetches the latest risk records for a given scoring model. The
//! response is decoded leniently and otherwise passed through as-is.

use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::models::RiskRecord;

/// Path of the scoring endpoint, relative to the backend base URL
pub const RISK_SCORES_PATH: &str = "/api/risk_scores";

/// Errors that can occur while fetching scores
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned status {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can produce risk records for a model
///
/// The dashboard runtime is generic over this so tests can script
/// responses and their arrival order.
pub trait ScoreSource: Send + Sync + 'static {
    fn fetch_scores(
        &self,
        model: &str,
    ) -> impl Future<Output = Result<Vec<RiskRecord>, ScoringError>> + Send;
}

/// HTTP client for `GET /api/risk_scores?model=<model>`
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    endpoint: String,
}

impl ScoringClient {
    /// Create a client for the backend at `base_url`
    ///
    /// With no timeout a request that never completes stays pending.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ScoringError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ScoringClient {
            client: builder.build()?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RISK_SCORES_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the current risk records for `model`
    pub async fn fetch(&self, model: &str) -> Result<Vec<RiskRecord>, ScoringError> {
        log::debug!("Fetching risk scores from {} (model {})", self.endpoint, model);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("model", model)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let records: Vec<RiskRecord> = serde_json::from_slice(&body)?;

        log::info!("Received {} risk record(s) for model {}", records.len(), model);
        Ok(records)
    }
}

impl ScoreSource for ScoringClient {
    fn fetch_scores(
        &self,
        model: &str,
    ) -> impl Future<Output = Result<Vec<RiskRecord>, ScoringError>> + Send {
        self.fetch(model)
    }
}
