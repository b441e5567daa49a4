use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// NAV feed error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("NAV request failed: {0}")]
    Http(String),

    #[error("NAV parsing error: {0}")]
    Parse(String),

    #[error("Subscription error: {0}")]
    Subscription(String),
}

/// Net asset value per token of an SPV at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavUpdate {
    pub spv_id: String,
    pub nav_per_token: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Market data source for SPV prices
#[async_trait]
pub trait PriceFeedPort: Send + Sync {
    /// Subscribe to NAV updates for the given SPVs.
    /// The feed stops producing once the receiver is dropped.
    async fn subscribe(&self, spv_ids: Vec<String>) -> Result<mpsc::Receiver<NavUpdate>, FeedError>;
}
