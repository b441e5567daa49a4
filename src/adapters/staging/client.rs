//! Staging API Client
//!
//! Posts a swap request to the staging API and returns the transaction plan
//! for wallet-side signing. One request per call, no retry policy.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;

use crate::ports::staging::{StageSwapRequest, StagedSwap, StagingError, StagingPort};

#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Base URL for the staging API
    pub api_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl StagingConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpStagingClient {
    config: StagingConfig,
    http: Client,
}

impl HttpStagingClient {
    pub fn new(config: StagingConfig) -> Result<Self, StagingError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StagingError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn stage_url(&self) -> String {
        format!("{}/swap/stage", self.config.api_url)
    }
}

#[async_trait]
impl StagingPort for HttpStagingClient {
    async fn stage_swap(&self, request: StageSwapRequest) -> Result<StagedSwap, StagingError> {
        tracing::info!(
            "Staging swap {} {} -> {} for {}",
            request.amount, request.from_token, request.to_token, request.wallet_address
        );

        let response = self
            .http
            .post(self.stage_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| StagingError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StagingError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let staged: StagedSwap = response
            .json()
            .await
            .map_err(|e| StagingError::InvalidPlan(format!("Failed to parse response: {}", e)))?;

        staged.transaction.validate()?;
        tracing::debug!(
            "Staged {}::{} with {} args",
            staged.transaction.contract_address,
            staged.transaction.method,
            staged.transaction.args.len()
        );
        Ok(staged)
    }
}
