//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Euphena swap engine.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::base44::{Base44Client, Base44Config};
use crate::adapters::chain::ChainBalanceReader;
use crate::adapters::feed::{NavPoller, NavPollerConfig};
use crate::adapters::staging::{HttpStagingClient, StagingConfig};
use crate::application::{
    display_balance, BalanceService, InvestmentOrder, PortfolioService, QuoteSession, QuoteState,
    SwapService,
};
use crate::config::{load_config, Config};
use crate::domain::{format_units, SwapForm, SwapQuoter, TokenRegistry};
use crate::ports::{BackendPort, PriceFeedPort};

const DEFAULT_CONFIG: &str = "config/euphena.toml";

/// Euphena - EUT/SPV swap quoting, staging and portfolio tool
#[derive(Parser, Debug)]
#[command(
    name = "euphena",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Swap quoting, staging and portfolio tool for the Euphena marketplace",
    long_about = "Euphena quotes swaps between the EUT utility token and SPV security tokens, \
                  stages swap transactions for wallet signing and reports investor portfolios."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured tokens and rates
    Tokens(TokensCmd),

    /// Quote a swap between two tokens
    Quote(QuoteCmd),

    /// Quote and stage a swap transaction for signing
    Stage(StageCmd),

    /// Show wallet balances for every configured token
    Balances(BalancesCmd),

    /// Show the signed-in investor's portfolio
    Portfolio(PortfolioCmd),

    /// Invest EUT into an SPV
    Invest(InvestCmd),

    /// Stream SPV NAV updates
    WatchNav(WatchNavCmd),
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Tokens(cmd) => &cmd.config,
            Command::Quote(cmd) => &cmd.config,
            Command::Stage(cmd) => &cmd.config,
            Command::Balances(cmd) => &cmd.config,
            Command::Portfolio(cmd) => &cmd.config,
            Command::Invest(cmd) => &cmd.config,
            Command::WatchNav(cmd) => &cmd.config,
        }
    }
}

/// List tokens
#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Get swap quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Source token identifier (e.g., EUT)
    #[arg(value_name = "FROM")]
    pub from_token: String,

    /// Destination token identifier (e.g., SPV-ALPHA)
    #[arg(value_name = "TO")]
    pub to_token: String,

    /// Amount of the source token
    #[arg(value_name = "AMOUNT")]
    pub amount: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override the platform fee in basis points
    #[arg(long, value_name = "BPS")]
    pub fee_bps: Option<u16>,
}

/// Stage swap
#[derive(Parser, Debug)]
pub struct StageCmd {
    /// Source token identifier (e.g., EUT)
    #[arg(value_name = "FROM")]
    pub from_token: String,

    /// Destination token identifier (e.g., SPV-ALPHA)
    #[arg(value_name = "TO")]
    pub to_token: String,

    /// Amount of the source token
    #[arg(value_name = "AMOUNT")]
    pub amount: String,

    /// Wallet that will sign the transaction
    #[arg(short, long, value_name = "ADDRESS")]
    pub wallet: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Skip the on-chain balance check
    #[arg(long)]
    pub skip_balance_check: bool,
}

/// Show balances
#[derive(Parser, Debug)]
pub struct BalancesCmd {
    /// Wallet address to inspect
    #[arg(short, long, value_name = "ADDRESS")]
    pub wallet: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Show portfolio
#[derive(Parser, Debug)]
pub struct PortfolioCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// Invest into an SPV
#[derive(Parser, Debug)]
pub struct InvestCmd {
    /// SPV record id
    #[arg(value_name = "SPV")]
    pub spv_id: String,

    /// EUT amount to invest
    #[arg(value_name = "AMOUNT")]
    pub amount: Decimal,

    /// Current NAV per token of the SPV
    #[arg(long, value_name = "NAV")]
    pub nav: Decimal,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Stream NAV updates
#[derive(Parser, Debug)]
pub struct WatchNavCmd {
    /// SPV ids to watch
    #[arg(value_name = "SPV", required = true)]
    pub spv_ids: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override the poll interval in seconds
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Tokens(cmd) => tokens_command(cmd).await,
        Command::Quote(cmd) => quote_command(cmd).await,
        Command::Stage(cmd) => stage_command(cmd).await,
        Command::Balances(cmd) => balances_command(cmd).await,
        Command::Portfolio(cmd) => portfolio_command(cmd).await,
        Command::Invest(cmd) => invest_command(cmd).await,
        Command::WatchNav(cmd) => watch_nav_command(cmd).await,
    }
}

fn load(path: &Path) -> Result<(Config, TokenRegistry)> {
    let config = load_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let registry = config.token_registry().context("Invalid token registry")?;
    Ok((config, registry))
}

async fn chain_reader(config: &Config) -> Result<ChainBalanceReader> {
    let reader = ChainBalanceReader::new(&config.chain.get_rpc_url())
        .context("Failed to connect to chain RPC")?;
    if let Some(chain_id) = config.chain.chain_id {
        reader.ensure_chain(chain_id).await.context("Chain RPC check failed")?;
    }
    Ok(reader)
}

fn backend_client(config: &Config) -> Result<Base44Client> {
    let mut backend = Base44Config::new(&config.backend.base_url, &config.backend.app_id)
        .with_timeout(config.backend.timeout());
    if let Some(key) = config.backend.get_api_key() {
        backend = backend.with_api_key(key);
    }
    Base44Client::new(backend).context("Failed to create backend client")
}

async fn tokens_command(cmd: TokensCmd) -> Result<()> {
    let (config, registry) = load(&cmd.config)?;

    println!("Fee: {} bps", config.swap.fee_bps);
    for token in registry.iter() {
        let rate = if token.is_security() {
            format_units(token.rate, crate::domain::RATE_DECIMALS)
        } else {
            "-".to_string()
        };
        println!(
            "{:<12} {:<8} {:<9} decimals={:<3} rate={:<10} {}",
            token.identifier, token.symbol, token.token_type, token.decimals, rate, token.name
        );
    }
    Ok(())
}

async fn quote_command(cmd: QuoteCmd) -> Result<()> {
    let (config, registry) = load(&cmd.config)?;
    let quoter = SwapQuoter::new(cmd.fee_bps.unwrap_or(config.swap.fee_bps))?;

    let session = QuoteSession::new(Arc::new(registry), quoter);
    session
        .request(&cmd.from_token, &cmd.to_token, &cmd.amount)
        .await
        .context("Quote task failed")?;

    match session.current() {
        QuoteState::Ready(quote) => {
            println!("Quote: {} {} -> {} {}", quote.amount_in, quote.from_token, quote.amount_out, quote.to_token);
            println!("Fee: {}", quote.fee);
            if !quote.rate.is_empty() {
                println!("Rate: {}", quote.rate);
            }
        }
        QuoteState::Failed(message) => bail!(message),
        QuoteState::Idle | QuoteState::Pending => println!("Enter a positive amount to get a quote"),
    }
    Ok(())
}

async fn stage_command(cmd: StageCmd) -> Result<()> {
    let (config, registry) = load(&cmd.config)?;
    let registry = Arc::new(registry);
    let quoter = SwapQuoter::new(config.swap.fee_bps)?;

    let available = if cmd.skip_balance_check {
        None
    } else {
        let balances = BalanceService::new(Arc::new(chain_reader(&config).await?));
        match registry.get(&cmd.from_token) {
            Ok(token) => balances.fetch_one(token, &cmd.wallet).await,
            Err(_) => None,
        }
    };

    let staging_config = StagingConfig {
        timeout: config.staging.timeout(),
        ..StagingConfig::new(config.staging.get_api_url())
    };
    let staging = HttpStagingClient::new(staging_config).context("Failed to create staging client")?;

    let service = SwapService::new(registry, quoter, Arc::new(staging));
    let form = SwapForm::new(&cmd.from_token, &cmd.to_token, &cmd.amount);
    let prepared = service.prepare_swap(&form, &cmd.wallet, available).await?;

    println!(
        "Quote: {} {} -> {} {} (fee {})",
        prepared.quote.amount_in,
        prepared.quote.from_token,
        prepared.quote.amount_out,
        prepared.quote.to_token,
        prepared.quote.fee
    );
    println!("Contract: {}", prepared.staged.transaction.contract_address);
    println!("Method: {}", prepared.staged.transaction.method);
    println!("Args: {}", serde_json::to_string(&prepared.staged.transaction.args)?);
    Ok(())
}

async fn balances_command(cmd: BalancesCmd) -> Result<()> {
    let (config, registry) = load(&cmd.config)?;
    let balances = BalanceService::new(Arc::new(chain_reader(&config).await?));

    println!("Wallet: {}", cmd.wallet);
    for token in registry.iter() {
        let balance = balances.fetch_one(token, &cmd.wallet).await;
        println!("{:<12} {}", token.symbol, display_balance(balance, token));
    }
    Ok(())
}

async fn portfolio_command(cmd: PortfolioCmd) -> Result<()> {
    let (config, _) = load(&cmd.config)?;
    let backend: Arc<dyn BackendPort> = Arc::new(backend_client(&config)?);
    let service = PortfolioService::new(backend);

    let summary = service.summary().await.context("Failed to load portfolio")?;

    if cmd.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Investor: {}", summary.email);
    println!("Wallet: {} EUT", summary.wallet_balance);
    println!("Invested: {} EUT across {} active investments", summary.total_invested, summary.active_investments);
    println!("Tokens: {}", summary.total_tokens);
    for holding in &summary.holdings {
        println!("  {:<24} {:>14} EUT {:>14} tokens", holding.spv_id, holding.invested, holding.tokens);
    }
    println!("Total value: {} EUT", summary.total_value());
    Ok(())
}

async fn invest_command(cmd: InvestCmd) -> Result<()> {
    let (config, _) = load(&cmd.config)?;
    let service = PortfolioService::new(Arc::new(backend_client(&config)?));

    let order = InvestmentOrder {
        spv_id: cmd.spv_id,
        amount: cmd.amount,
        nav_per_token: cmd.nav,
        min_investment: config.swap.min_investment,
    };
    let investment = service.invest(&order).await?;

    println!(
        "Investment {}: {} EUT -> {} tokens of {} ({})",
        investment.id, investment.invested_amount, investment.token_amount, investment.spv_id, investment.status
    );
    Ok(())
}

async fn watch_nav_command(cmd: WatchNavCmd) -> Result<()> {
    let (config, _) = load(&cmd.config)?;
    let Some(feed) = config.feed.as_ref() else {
        bail!("No [feed] section in {}", cmd.config.display());
    };

    let interval = Duration::from_secs(cmd.interval.unwrap_or(feed.poll_interval_secs));
    let poller = NavPoller::new(NavPollerConfig::new(&feed.nav_url, interval))?;
    let mut updates = poller.subscribe(cmd.spv_ids).await?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => println!(
                    "{} {:<24} {}",
                    update.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    update.spv_id,
                    update.nav_per_token
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_quote() {
        let args = vec!["euphena", "quote", "EUT", "SPV-ALPHA", "100"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Quote(cmd) => {
                assert_eq!(cmd.from_token, "EUT");
                assert_eq!(cmd.to_token, "SPV-ALPHA");
                assert_eq!(cmd.amount, "100");
                assert_eq!(cmd.fee_bps, None);
            }
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_cli_app_parse_quote_with_fee() {
        let args = vec!["euphena", "quote", "SPV-ALPHA", "EUT", "0.5", "--fee-bps", "0"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Quote(cmd) => assert_eq!(cmd.fee_bps, Some(0)),
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_cli_app_parse_stage() {
        let args = vec![
            "euphena", "stage", "EUT", "SPV-ALPHA", "250",
            "--wallet", "0x000000000000000000000000000000000000dEaD",
            "--skip-balance-check",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Stage(cmd) => {
                assert_eq!(cmd.amount, "250");
                assert_eq!(cmd.wallet, "0x000000000000000000000000000000000000dEaD");
                assert!(cmd.skip_balance_check);
            }
            _ => panic!("Expected Stage command"),
        }
    }

    #[test]
    fn test_stage_requires_wallet() {
        let args = vec!["euphena", "stage", "EUT", "SPV-ALPHA", "250"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_invest() {
        let args = vec!["euphena", "invest", "spv-1", "1500", "--nav", "1.25"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Invest(cmd) => {
                assert_eq!(cmd.spv_id, "spv-1");
                assert_eq!(cmd.amount, Decimal::from(1500));
                assert_eq!(cmd.nav, Decimal::new(125, 2));
            }
            _ => panic!("Expected Invest command"),
        }
    }

    #[test]
    fn test_cli_app_parse_watch_nav() {
        let args = vec!["euphena", "watch-nav", "spv-1", "spv-2", "--interval", "5"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::WatchNav(cmd) => {
                assert_eq!(cmd.spv_ids, vec!["spv-1", "spv-2"]);
                assert_eq!(cmd.interval, Some(5));
            }
            _ => panic!("Expected WatchNav command"),
        }
    }

    #[test]
    fn test_watch_nav_requires_spv() {
        assert!(CliApp::try_parse_from(vec!["euphena", "watch-nav"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["euphena", "-v", "--debug", "tokens"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
    }

    #[test]
    fn test_default_config_path() {
        let app = CliApp::try_parse_from(vec!["euphena", "portfolio"]).unwrap();
        assert_eq!(app.command.config_path(), Path::new("config/euphena.toml"));

        let app = CliApp::try_parse_from(vec!["euphena", "balances", "-w", "0xabc", "-c", "local.toml"]).unwrap();
        assert_eq!(app.command.config_path(), Path::new("local.toml"));
    }
}
