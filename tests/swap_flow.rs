//! Swap Flow Integration Tests
//!
//! Verify the swap and portfolio components work together:
//! 1. Config file -> TokenRegistry -> QuoteSession
//! 2. BalanceService -> SwapService -> StagingPort
//! 3. PortfolioService invest -> summary recomputed from the backend
//!
//! All tests are deterministic (no real network calls) and use in-memory ports.

use std::sync::Arc;

use chrono::Utc;
use ethers::types::U256;
use rust_decimal_macros::dec;
use serde_json::json;

use euphena_swap::application::{
    display_balance, BalanceService, InvestmentOrder, PortfolioError, PortfolioService, QuoteSession,
    QuoteState, SwapError, SwapService, UNKNOWN_BALANCE,
};
use euphena_swap::config::load_config;
use euphena_swap::domain::{unit_scale, SwapForm, SwapQuoter, TokenRegistry, ValidationError};
use euphena_swap::ports::mocks::{EchoStaging, InMemoryBackend, ScriptedFeed, StaticBalances};
use euphena_swap::ports::{EntityKind, NavUpdate, PriceFeedPort, StagingError};

// ============================================================================
// Test Fixtures
// ============================================================================

const WALLET: &str = "0x000000000000000000000000000000000000dEaD";
const SWAP_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Registry loaded from the shipped sample configuration
fn sample_registry() -> (TokenRegistry, u16) {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/euphena.toml");
    let config = load_config(path).expect("sample config should load");
    let registry = config.token_registry().expect("sample registry should build");
    (registry, config.swap.fee_bps)
}

fn eut(amount: u64) -> U256 {
    U256::from(amount) * unit_scale(18).unwrap()
}

// ============================================================================
// Quote session
// ============================================================================

#[tokio::test]
async fn test_sample_config_quotes_both_directions() {
    let (registry, fee_bps) = sample_registry();
    assert_eq!(fee_bps, 50);

    let session = QuoteSession::new(Arc::new(registry), SwapQuoter::new(fee_bps).unwrap());

    assert!(session.request("EUT", "SPV-SOLAR-EU", "100").await.unwrap());
    let quote = session.current().quote().cloned().expect("quote ready");
    assert_eq!(quote.amount_out, "24.875");
    assert_eq!(quote.fee, "0.5");
    assert_eq!(quote.rate, "1 EUT = 0.25 SOLAR");

    assert!(session.request("SPV-SOLAR-EU", "EUT", "24.875").await.unwrap());
    let back = session.current().quote().cloned().expect("quote ready");
    assert_eq!(back.amount_out, "99.0025");
    assert_eq!(back.fee, "0.4975");
}

#[tokio::test]
async fn test_latest_request_wins() {
    let (registry, fee_bps) = sample_registry();
    let session = QuoteSession::new(Arc::new(registry), SwapQuoter::new(fee_bps).unwrap());

    let first = session.request("EUT", "SPV-MIAMI-RE", "100");
    let second = session.request("EUT", "SPV-MIAMI-RE", "200");

    assert!(!first.await.unwrap());
    assert!(second.await.unwrap());
    assert_eq!(session.generation(), 2);
    assert_eq!(session.current().quote().unwrap().amount_in, "200");
}

#[tokio::test]
async fn test_unsupported_pair_is_session_state() {
    let (registry, fee_bps) = sample_registry();
    let session = QuoteSession::new(Arc::new(registry), SwapQuoter::new(fee_bps).unwrap());

    assert!(session.request("SPV-MIAMI-RE", "SPV-SOLAR-EU", "1").await.unwrap());
    match session.current() {
        QuoteState::Failed(message) => {
            assert_eq!(message, "Swaps only supported between utility and security tokens")
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    assert!(session.request("EUT", "SPV-MIAMI-RE", "0").await.unwrap());
    assert_eq!(session.current(), QuoteState::Idle);
}

// ============================================================================
// Balances and staging
// ============================================================================

#[tokio::test]
async fn test_stage_swap_with_known_balance() {
    let (registry, fee_bps) = sample_registry();
    let registry = Arc::new(registry);

    let balances = BalanceService::new(Arc::new(StaticBalances::new().with_balance("EUT", eut(500))));
    let from = registry.get("EUT").unwrap();
    let to = registry.get("SPV-MIAMI-RE").unwrap();
    let pair = balances.fetch_pair(from, to, WALLET).await;
    assert_eq!(display_balance(pair.from, from), "500");
    assert_eq!(display_balance(pair.to, to), UNKNOWN_BALANCE);

    let staging = Arc::new(EchoStaging::new(SWAP_CONTRACT));
    let service = SwapService::new(Arc::clone(&registry), SwapQuoter::new(fee_bps).unwrap(), staging.clone());

    let prepared = service
        .prepare_swap(&SwapForm::new("EUT", "SPV-MIAMI-RE", "100"), WALLET, pair.from)
        .await
        .unwrap();

    assert_eq!(prepared.quote.amount_out, "99.5");
    assert_eq!(prepared.staged.transaction.contract_address, SWAP_CONTRACT);

    let requests = staging.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, "100");
    assert_eq!(requests[0].wallet_address, WALLET);
}

#[tokio::test]
async fn test_insufficient_balance_never_reaches_staging() {
    let (registry, fee_bps) = sample_registry();
    let staging = Arc::new(EchoStaging::new(SWAP_CONTRACT));
    let service = SwapService::new(Arc::new(registry), SwapQuoter::new(fee_bps).unwrap(), staging.clone());

    let err = service
        .prepare_swap(&SwapForm::new("EUT", "SPV-MIAMI-RE", "100"), WALLET, Some(eut(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::Validation(ValidationError::InsufficientBalance { .. })));
    assert!(staging.get_requests().is_empty());
}

#[tokio::test]
async fn test_staging_failure_becomes_toast_message() {
    let (registry, fee_bps) = sample_registry();
    let staging = Arc::new(EchoStaging::failing(StagingError::Api {
        status: 503,
        message: "pool paused".to_string(),
    }));
    let service = SwapService::new(Arc::new(registry), SwapQuoter::new(fee_bps).unwrap(), staging);

    let err = service
        .prepare_swap(&SwapForm::new("EUT", "SPV-MIAMI-RE", "1"), WALLET, None)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Swap failed:"));
    assert!(err.to_string().contains("pool paused"));
}

// ============================================================================
// Portfolio
// ============================================================================

#[tokio::test]
async fn test_invest_then_summary_reflects_new_holding() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_user(json!({"id": "u1", "email": "ada@example.com", "wallet_balance": 2000, "kyc_status": "approved"})),
    );
    let service = PortfolioService::new(backend.clone());

    let order = InvestmentOrder {
        spv_id: "spv-miami".to_string(),
        amount: dec!(1500),
        nav_per_token: dec!(1.25),
        min_investment: dec!(500),
    };
    let investment = service.invest(&order).await.unwrap();
    assert_eq!(investment.token_amount, dec!(1200));

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.wallet_balance, dec!(500));
    assert_eq!(summary.total_invested, dec!(1500));
    assert_eq!(summary.active_investments, 1);
    assert_eq!(summary.holdings[0].spv_id, "spv-miami");
    assert_eq!(backend.records(EntityKind::Transaction).len(), 1);
}

#[tokio::test]
async fn test_invest_below_minimum_makes_no_backend_call() {
    let backend = Arc::new(InMemoryBackend::new().with_user(json!({"id": "u1", "email": "ada@example.com"})));
    let service = PortfolioService::new(backend.clone());

    let order = InvestmentOrder {
        spv_id: "spv-miami".to_string(),
        amount: dec!(100),
        nav_per_token: dec!(1),
        min_investment: dec!(500),
    };
    let err = service.invest(&order).await.unwrap_err();

    assert!(matches!(err, PortfolioError::Validation(ValidationError::BelowMinimum { .. })));
    assert!(backend.get_calls().is_empty());
}

// ============================================================================
// NAV feed
// ============================================================================

#[tokio::test]
async fn test_feed_delivers_only_subscribed_spvs() {
    let update = |spv: &str, nav| NavUpdate {
        spv_id: spv.to_string(),
        nav_per_token: nav,
        timestamp: Utc::now(),
    };
    let feed = ScriptedFeed::new(vec![
        update("spv-miami", dec!(1.25)),
        update("spv-solar", dec!(4.10)),
        update("spv-miami", dec!(1.27)),
    ]);

    let mut rx = feed.subscribe(vec!["spv-miami".to_string()]).await.unwrap();
    let mut navs = Vec::new();
    while let Some(update) = rx.recv().await {
        navs.push(update.nav_per_token);
    }

    assert_eq!(navs, vec![dec!(1.25), dec!(1.27)]);
}
