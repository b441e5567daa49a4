//! Portfolio Totals
//!
//! Typed views over backend User and Investment records, and a summary that
//! is recomputed from freshly fetched lists every time it is requested.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The logged-in user as returned by `auth.me()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// EUT balance held on the platform
    #[serde(default)]
    pub wallet_balance: Decimal,
    #[serde(default = "default_kyc_status")]
    pub kyc_status: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

fn default_kyc_status() -> String {
    "pending".to_string()
}

impl UserProfile {
    pub fn from_record(record: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(record)
    }

    pub fn is_kyc_approved(&self) -> bool {
        self.kyc_status == "approved"
    }
}

/// An investment of EUT into an SPV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: String,
    pub spv_id: String,
    pub investor_email: String,
    #[serde(default)]
    pub invested_amount: Decimal,
    #[serde(default)]
    pub token_amount: Decimal,
    #[serde(default)]
    pub status: String,
}

impl Investment {
    pub fn from_record(record: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(record)
    }

    /// Cancelled and refunded investments no longer count toward holdings
    pub fn is_active(&self) -> bool {
        !matches!(self.status.as_str(), "cancelled" | "refunded")
    }
}

/// Position in a single SPV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub spv_id: String,
    pub invested: Decimal,
    pub tokens: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub email: String,
    pub wallet_balance: Decimal,
    pub total_invested: Decimal,
    pub total_tokens: Decimal,
    pub active_investments: usize,
    /// Sorted by SPV id
    pub holdings: Vec<Holding>,
}

impl PortfolioSummary {
    pub fn from_records(user: &UserProfile, investments: &[Investment]) -> Self {
        let mut by_spv: BTreeMap<&str, Holding> = BTreeMap::new();
        let mut active = 0;

        for investment in investments.iter().filter(|i| i.is_active()) {
            active += 1;
            let holding = by_spv
                .entry(investment.spv_id.as_str())
                .or_insert_with(|| Holding {
                    spv_id: investment.spv_id.clone(),
                    invested: Decimal::ZERO,
                    tokens: Decimal::ZERO,
                });
            holding.invested += investment.invested_amount;
            holding.tokens += investment.token_amount;
        }

        let holdings: Vec<Holding> = by_spv.into_values().collect();

        Self {
            email: user.email.clone(),
            wallet_balance: user.wallet_balance,
            total_invested: holdings.iter().map(|h| h.invested).sum(),
            total_tokens: holdings.iter().map(|h| h.tokens).sum(),
            active_investments: active,
            holdings,
        }
    }

    /// Wallet balance plus capital deployed into SPVs
    pub fn total_value(&self) -> Decimal {
        self.wallet_balance + self.total_invested
    }
}
