//! Wallet balances for the two sides of a swap form

use std::sync::Arc;

use ethers::types::U256;

use crate::domain::{format_units, TokenInfo};
use crate::ports::BalancePort;

/// Shown in place of a balance that could not be read
pub const UNKNOWN_BALANCE: &str = "—";

/// Balances of the selected tokens; `None` when the read failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairBalances {
    pub from: Option<U256>,
    pub to: Option<U256>,
}

/// Render a balance at the token's precision, or "—" if unknown
pub fn display_balance(balance: Option<U256>, token: &TokenInfo) -> String {
    match balance {
        Some(units) => format_units(units, token.decimals),
        None => UNKNOWN_BALANCE.to_string(),
    }
}

#[derive(Clone)]
pub struct BalanceService {
    port: Arc<dyn BalancePort>,
}

impl BalanceService {
    pub fn new(port: Arc<dyn BalancePort>) -> Self {
        Self { port }
    }

    /// Read both balances concurrently. A failure on one side is logged and
    /// recorded as `None`; it never fails the pair.
    pub async fn fetch_pair(&self, from: &TokenInfo, to: &TokenInfo, wallet: &str) -> PairBalances {
        let (from_balance, to_balance) = tokio::join!(
            self.fetch_one(from, wallet),
            self.fetch_one(to, wallet),
        );

        PairBalances {
            from: from_balance,
            to: to_balance,
        }
    }

    pub async fn fetch_one(&self, token: &TokenInfo, wallet: &str) -> Option<U256> {
        match self.port.balance_of(token, wallet).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::warn!("Balance read for {} failed: {}", token.identifier, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{unit_scale, TokenType};
    use crate::ports::mocks::StaticBalances;

    fn token(id: &str, token_type: TokenType) -> TokenInfo {
        TokenInfo {
            identifier: id.to_string(),
            symbol: id.to_string(),
            name: id.to_string(),
            token_type,
            decimals: 18,
            rate: unit_scale(18).unwrap(),
            rate_hint: String::new(),
            contract_address: None,
        }
    }

    #[tokio::test]
    async fn test_failure_on_one_side_is_none() {
        let port = StaticBalances::new().with_balance("EUT", unit_scale(18).unwrap() * U256::from(42u64));
        let service = BalanceService::new(Arc::new(port));

        let eut = token("EUT", TokenType::Utility);
        let spv = token("SPV-A", TokenType::Security);
        let balances = service.fetch_pair(&eut, &spv, "0xabc").await;

        assert_eq!(balances.from, Some(unit_scale(18).unwrap() * U256::from(42u64)));
        assert_eq!(balances.to, None);
        assert_eq!(display_balance(balances.from, &eut), "42");
        assert_eq!(display_balance(balances.to, &spv), "—");
    }
}
