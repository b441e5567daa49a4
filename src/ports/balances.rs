//! On-chain balance port

use async_trait::async_trait;
use ethers::types::U256;
use thiserror::Error;

use crate::domain::TokenInfo;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("RPC endpoint serves chain {actual}, expected {expected}")]
    WrongChain { expected: u64, actual: u64 },
}

#[async_trait]
pub trait BalancePort: Send + Sync {
    /// Balance of `token` held by `wallet`, in the token's base units
    async fn balance_of(&self, token: &TokenInfo, wallet: &str) -> Result<U256, BalanceError>;
}
