use std::collections::BTreeMap;
use std::time::Duration;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::intake::CanonicalRecord;
use crate::config::ScoringConfig;
use crate::error::ApiError;

/// Raw per-condition results exactly as the scoring service returned them.
/// The gateway never reinterprets risk numbers; reconciliation happens later.
pub type RiskAssessment = BTreeMap<String, Value>;

/// Feature lists the scoring service wants per condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredFields(pub BTreeMap<String, Vec<String>>);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("scoring service unreachable: {message}")]
    Unavailable { message: String, timed_out: bool },
    #[error("scoring service rejected the request: {0}")]
    Rejected(String),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable { message, timed_out } => {
                ApiError::UpstreamUnavailable { message, timed_out }
            }
            GatewayError::Rejected(message) => ApiError::UpstreamRejected(message),
        }
    }
}

#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn assess_risk(&self, record: &CanonicalRecord) -> Result<RiskAssessment, GatewayError>;
    async fn required_fields(&self) -> Result<RequiredFields, GatewayError>;
}

/// Success/error envelope wrapping every scoring-service response.
#[derive(Debug, Deserialize)]
struct AssessEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    results: Option<RiskAssessment>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequiredFieldsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    required_fields: Option<RequiredFields>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScoringClient {
    /// One client with a single fixed timeout; a request that exceeds it
    /// fails, it is never retried (the upstream model call is billed).
    pub fn new(config: &ScoringConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn transport_error(err: reqwest::Error) -> GatewayError {
        GatewayError::Unavailable {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn assess_risk(&self, record: &CanonicalRecord) -> Result<RiskAssessment, GatewayError> {
        let url = format!("{}/assess_risk", self.base_url);
        debug!(url = %url, features = record.len(), "calling scoring service");

        let response = self
            .http
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(Self::transport_error)?;

        // Upstream signals application failure inside the envelope (often
        // with a 500 status), so the body is parsed regardless of status.
        let envelope: AssessEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Rejected(format!("malformed scoring response: {e}")))?;

        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| "risk assessment failed".to_string());
            warn!(message = %message, "scoring service rejected request");
            return Err(GatewayError::Rejected(message));
        }
        envelope
            .results
            .ok_or_else(|| GatewayError::Rejected("scoring response missing results".to_string()))
    }

    async fn required_fields(&self) -> Result<RequiredFields, GatewayError> {
        let url = format!("{}/get_required_fields", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let envelope: RequiredFieldsEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Rejected(format!("malformed scoring response: {e}")))?;

        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| "failed to retrieve required fields".to_string());
            return Err(GatewayError::Rejected(message));
        }
        envelope
            .required_fields
            .ok_or_else(|| GatewayError::Rejected("scoring response missing fields".to_string()))
    }
}
