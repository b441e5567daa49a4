use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};

use crate::domain::TokenInfo;
use crate::ports::balances::{BalanceError, BalancePort};

abigen!(
    Erc20,
    r#"[
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

/// Reads ERC-20 balances, or the native balance for tokens without a contract
#[derive(Debug, Clone)]
pub struct ChainBalanceReader {
    provider: Arc<Provider<Http>>,
}

impl ChainBalanceReader {
    pub fn new(rpc_url: &str) -> Result<Self, BalanceError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| BalanceError::Rpc(format!("Invalid RPC url {}: {}", rpc_url, e)))?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    /// Fail unless the RPC endpoint serves `expected`
    pub async fn ensure_chain(&self, expected: u64) -> Result<(), BalanceError> {
        let actual = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| BalanceError::Rpc(e.to_string()))?;
        check_chain_id(expected, actual)
    }
}

fn check_chain_id(expected: u64, actual: U256) -> Result<(), BalanceError> {
    if actual == U256::from(expected) {
        return Ok(());
    }
    Err(BalanceError::WrongChain {
        expected,
        actual: if actual > U256::from(u64::MAX) { u64::MAX } else { actual.as_u64() },
    })
}

pub(crate) fn parse_wallet(wallet: &str) -> Result<Address, BalanceError> {
    Address::from_str(wallet.trim()).map_err(|e| BalanceError::InvalidAddress(format!("{}: {}", wallet, e)))
}

#[async_trait]
impl BalancePort for ChainBalanceReader {
    async fn balance_of(&self, token: &TokenInfo, wallet: &str) -> Result<U256, BalanceError> {
        let owner = parse_wallet(wallet)?;

        let balance = match token.contract_address {
            Some(contract) => Erc20::new(contract, Arc::clone(&self.provider))
                .balance_of(owner)
                .call()
                .await
                .map_err(|e| BalanceError::Rpc(e.to_string()))?,
            None => self
                .provider
                .get_balance(owner, None)
                .await
                .map_err(|e| BalanceError::Rpc(e.to_string()))?,
        };

        tracing::debug!("{} balance of {:?}: {}", token.identifier, owner, balance);
        Ok(balance)
    }
}
