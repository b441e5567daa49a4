//! Portfolio Service
//!
//! Builds the investor's portfolio view and records new investments through
//! the injected backend. Totals are recomputed from a freshly fetched list on
//! every call; nothing is cached or patched in place.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::domain::{validate_investment, Investment, PortfolioSummary, UserProfile, ValidationError};
use crate::ports::{BackendError, BackendPort, EntityKind};

/// Precision of token amounts recorded on an investment
const TOKEN_AMOUNT_SCALE: u32 = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortfolioError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("Malformed {entity} record: {message}")]
    Malformed { entity: EntityKind, message: String },
}

/// Parameters of a new investment into an SPV
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentOrder {
    pub spv_id: String,
    /// EUT to invest
    pub amount: Decimal,
    pub nav_per_token: Decimal,
    pub min_investment: Decimal,
}

pub struct PortfolioService {
    backend: Arc<dyn BackendPort>,
}

impl PortfolioService {
    pub fn new(backend: Arc<dyn BackendPort>) -> Self {
        Self { backend }
    }

    pub async fn current_user(&self) -> Result<UserProfile, PortfolioError> {
        let record = self.backend.me().await?;
        UserProfile::from_record(&record).map_err(|e| PortfolioError::Malformed {
            entity: EntityKind::User,
            message: e.to_string(),
        })
    }

    /// The signed-in investor's investments, newest first
    pub async fn investments(&self, email: &str) -> Result<Vec<Investment>, PortfolioError> {
        let records = self
            .backend
            .filter(
                EntityKind::Investment,
                json!({ "investor_email": email }),
                Some("-created_date"),
                None,
            )
            .await?;

        records
            .iter()
            .map(|record| {
                Investment::from_record(record).map_err(|e| PortfolioError::Malformed {
                    entity: EntityKind::Investment,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub async fn summary(&self) -> Result<PortfolioSummary, PortfolioError> {
        let user = self.current_user().await?;
        let investments = self.investments(&user.email).await?;
        tracing::debug!("Loaded {} investments for {}", investments.len(), user.email);
        Ok(PortfolioSummary::from_records(&user, &investments))
    }

    /// Invest EUT from the platform wallet into an SPV.
    ///
    /// Checks the minimum ticket and the wallet balance before touching the
    /// backend, then creates the Investment, debits the wallet and logs a
    /// Transaction.
    pub async fn invest(&self, order: &InvestmentOrder) -> Result<Investment, PortfolioError> {
        validate_investment(order.amount, order.min_investment)?;
        if order.nav_per_token <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(format!(
                "NAV per token for {} is not set",
                order.spv_id
            ))
            .into());
        }

        let token_amount = order
            .amount
            .checked_div(order.nav_per_token)
            .ok_or_else(|| {
                ValidationError::InvalidAmount(format!(
                    "{} EUT at NAV {} is out of range",
                    order.amount, order.nav_per_token
                ))
            })?
            .round_dp(TOKEN_AMOUNT_SCALE);

        let user = self.current_user().await?;
        if user.wallet_balance < order.amount {
            return Err(ValidationError::InsufficientBalance {
                available: user.wallet_balance.to_string(),
                requested: order.amount.to_string(),
            }
            .into());
        }

        let record = self
            .backend
            .create(
                EntityKind::Investment,
                json!({
                    "spv_id": order.spv_id,
                    "investor_email": user.email,
                    "invested_amount": order.amount,
                    "token_amount": token_amount,
                    "status": "active",
                }),
            )
            .await?;

        let investment = Investment::from_record(&record).map_err(|e| PortfolioError::Malformed {
            entity: EntityKind::Investment,
            message: e.to_string(),
        })?;

        if let Err(e) = self
            .backend
            .update_me(json!({ "wallet_balance": user.wallet_balance - order.amount }))
            .await
        {
            tracing::error!(
                "Investment {} created but wallet debit of {} EUT for {} failed: {}",
                investment.id,
                order.amount,
                user.email,
                e
            );
            return Err(e.into());
        }

        if let Err(e) = self
            .backend
            .create(
                EntityKind::Transaction,
                json!({
                    "type": "investment",
                    "user_email": user.email,
                    "spv_id": order.spv_id,
                    "amount": order.amount,
                    "investment_id": investment.id,
                }),
            )
            .await
        {
            tracing::error!(
                "Investment {} debited but its Transaction record failed: {}",
                investment.id,
                e
            );
            return Err(e.into());
        }

        tracing::info!(
            "{} invested {} EUT in {} for {} tokens",
            user.email,
            order.amount,
            order.spv_id,
            token_amount
        );
        Ok(investment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::InMemoryBackend;
    use rust_decimal_macros::dec;

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(
            InMemoryBackend::new()
                .with_user(json!({"id": "u1", "email": "ada@example.com", "wallet_balance": 1000}))
                .with_records(
                    EntityKind::Investment,
                    vec![
                        json!({"id": "i1", "spv_id": "spv-a", "investor_email": "ada@example.com",
                               "invested_amount": 200, "token_amount": 200, "status": "active",
                               "created_date": "2024-01-01T00:00:00Z"}),
                        json!({"id": "i2", "spv_id": "spv-a", "investor_email": "bob@example.com",
                               "invested_amount": 999, "token_amount": 999, "status": "active",
                               "created_date": "2024-01-02T00:00:00Z"}),
                    ],
                ),
        )
    }

    fn order(amount: Decimal) -> InvestmentOrder {
        InvestmentOrder {
            spv_id: "spv-b".to_string(),
            amount,
            nav_per_token: dec!(2),
            min_investment: dec!(100),
        }
    }

    #[tokio::test]
    async fn test_summary_only_includes_own_investments() {
        let service = PortfolioService::new(backend());
        let summary = service.summary().await.unwrap();

        assert_eq!(summary.total_invested, dec!(200));
        assert_eq!(summary.wallet_balance, dec!(1000));
        assert_eq!(summary.holdings.len(), 1);
    }

    #[tokio::test]
    async fn test_invest_records_and_debits() {
        let backend = backend();
        let service = PortfolioService::new(backend.clone());

        let investment = service.invest(&order(dec!(300))).await.unwrap();
        assert_eq!(investment.token_amount, dec!(150));
        assert_eq!(investment.invested_amount, dec!(300));

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.wallet_balance, dec!(700));
        assert_eq!(summary.total_invested, dec!(500));
        assert_eq!(backend.records(EntityKind::Transaction).len(), 1);
    }

    #[tokio::test]
    async fn test_invest_validation_happens_before_backend() {
        let backend = backend();
        let service = PortfolioService::new(backend.clone());

        let err = service.invest(&order(dec!(50))).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Validation(ValidationError::BelowMinimum { .. })));
        assert!(backend.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invest_insufficient_wallet() {
        let backend = backend();
        let service = PortfolioService::new(backend.clone());

        let err = service.invest(&order(dec!(5000))).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Validation(ValidationError::InsufficientBalance { .. })));
        assert_eq!(backend.get_calls(), vec!["auth.me".to_string()]);
    }

    #[tokio::test]
    async fn test_invest_out_of_range_token_amount() {
        let backend = backend();
        let service = PortfolioService::new(backend.clone());

        let order = InvestmentOrder {
            nav_per_token: dec!(0.0000000001),
            ..order(Decimal::MAX)
        };
        let err = service.invest(&order).await.unwrap_err();

        assert!(matches!(err, PortfolioError::Validation(ValidationError::InvalidAmount(_))));
        assert!(backend.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invest_debit_failure_stops_before_transaction() {
        let backend = backend();
        backend.fail_call("auth.updateMe", BackendError::Http("timeout".into()));
        let service = PortfolioService::new(backend.clone());

        let err = service.invest(&order(dec!(300))).await.unwrap_err();
        assert_eq!(err, PortfolioError::Backend(BackendError::Http("timeout".into())));

        assert_eq!(backend.records(EntityKind::Investment).len(), 3);
        assert!(backend.records(EntityKind::Transaction).is_empty());
        assert_eq!(
            backend.get_calls(),
            vec!["auth.me".to_string(), "Investment.create".to_string(), "auth.updateMe".to_string()]
        );
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced_raw() {
        let backend = backend();
        backend.fail_with(BackendError::Http("connection refused".into()));
        let service = PortfolioService::new(backend);

        let err = service.summary().await.unwrap_err();
        assert_eq!(err.to_string(), "Backend request failed: connection refused");
    }
}
