//! CLI Adapter
//!
//! Command-line interface for the Euphena swap engine.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    BalancesCmd, CliApp, Command, InvestCmd, PortfolioCmd, QuoteCmd, StageCmd, TokensCmd, WatchNavCmd,
};

use anyhow::Result;

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
