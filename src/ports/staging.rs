//! Swap staging port
//!
//! The staging API turns a quoted swap into a transaction plan for the
//! user's wallet to sign. Nothing is submitted on-chain from this crate.

use async_trait::async_trait;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("Staging API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Staging request failed: {0}")]
    Http(String),

    #[error("Invalid transaction plan: {0}")]
    InvalidPlan(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSwapRequest {
    pub from_token: String,
    pub to_token: String,
    /// Decimal amount as entered
    pub amount: String,
    pub wallet_address: String,
}

/// Contract call for the wallet to sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPlan {
    pub contract_address: String,
    pub method: String,
    /// ABI-encoded call arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

impl TransactionPlan {
    /// Check the plan is signable: a valid contract address and a method
    pub fn validate(&self) -> Result<Address, StagingError> {
        if self.method.trim().is_empty() {
            return Err(StagingError::InvalidPlan("missing method".into()));
        }
        Address::from_str(&self.contract_address).map_err(|e| {
            StagingError::InvalidPlan(format!(
                "bad contract address {}: {}",
                self.contract_address, e
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedQuote {
    pub amount_in: String,
    pub amount_out: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedSwap {
    pub transaction: TransactionPlan,
    pub quote: StagedQuote,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StagingPort: Send + Sync {
    /// Single request/response, no retries
    async fn stage_swap(&self, request: StageSwapRequest) -> Result<StagedSwap, StagingError>;
}
