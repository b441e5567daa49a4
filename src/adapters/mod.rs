//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - base44: hosted backend client (auth, entities, uploads)
//! - staging: swap staging API client
//! - chain: on-chain token balance reads
//! - feed: SPV NAV polling feed
//! - CLI: Command-line interface handlers

pub mod base44;
pub mod staging;
pub mod chain;
pub mod feed;
pub mod cli;

pub use base44::{Base44Client, Base44Config};
pub use staging::{HttpStagingClient, StagingConfig};
pub use chain::ChainBalanceReader;
pub use feed::{NavPoller, NavPollerConfig};
pub use cli::CliApp;
