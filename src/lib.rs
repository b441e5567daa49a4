//! Euphena Swap Engine Library
//!
//! Swap quoting between the EUT utility token and SPV security tokens,
//! swap staging, wallet balances and investor portfolios.
//!
//! # Modules
//!
//! - `domain`: Core logic (TokenRegistry, SwapQuoter, validation, PortfolioSummary)
//! - `ports`: Trait abstractions (BackendPort, StagingPort, BalancePort, PriceFeedPort)
//! - `adapters`: External implementations (base44, staging API, EVM chain, NAV feed, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Quote session and use-case services

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
