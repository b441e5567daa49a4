//! Euphena - swap quoting, staging and portfolio CLI
//!
//! Quotes EUT/SPV swaps, stages them for wallet signing and reports portfolios.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use euphena_swap::adapters::cli::{self, CliApp};
use euphena_swap::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in euphena.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let level = load_config(app.command.config_path()).ok().map(|c| c.logging.level);
    init_logging(app.verbose, app.debug, level.as_deref())?;

    cli::execute(app).await
}

fn init_logging(verbose: bool, debug: bool, config_level: Option<&str>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("warn")))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}
