//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/euphena.toml.

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{parse_units, TokenInfo, TokenRegistry, TokenType, BPS_DENOMINATOR, RATE_DECIMALS};

/// Main configuration structure matching config/euphena.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub swap: SwapSection,
    pub backend: BackendSection,
    pub staging: StagingSection,
    pub chain: ChainSection,
    #[serde(default)]
    pub feed: Option<FeedSection>,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// Swap pricing section
#[derive(Debug, Clone, Deserialize)]
pub struct SwapSection {
    /// Fee on the utility leg in basis points (0.5% = 50 bps)
    pub fee_bps: u16,
    /// Minimum EUT per SPV investment
    #[serde(default)]
    pub min_investment: Decimal,
}

/// Hosted backend section
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    /// base44 API root
    pub base_url: String,
    pub app_id: String,
    /// Optional API key (prefer BASE44_API_KEY in .env)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendSection {
    /// Get API key with environment variable fallback
    /// Checks BASE44_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("BASE44_API_KEY").ok()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Swap staging API section
#[derive(Debug, Clone, Deserialize)]
pub struct StagingSection {
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StagingSection {
    /// Get API URL with environment variable override
    /// Checks EUPHENA_STAGING_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var("EUPHENA_STAGING_URL").unwrap_or_else(|_| self.api_url.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// EVM chain section
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// JSON-RPC endpoint used for balance reads
    pub rpc_url: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl ChainSection {
    /// Get RPC URL with environment variable override
    /// Checks EUPHENA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("EUPHENA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

/// NAV feed section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    pub nav_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// A `[[tokens]]` registry entry
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub identifier: String,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub decimals: u8,
    /// Security-token base units bought per utility-token base unit ("0.5")
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub rate_hint: String,
    #[serde(default)]
    pub contract_address: Option<String>,
}

impl TokenEntry {
    fn to_token_info(&self) -> Result<TokenInfo, ConfigError> {
        let rate = match self.rate.as_deref() {
            Some(rate) => parse_units(rate, RATE_DECIMALS).map_err(|e| {
                ConfigError::ValidationError(format!("{}: invalid rate {:?}: {}", self.identifier, rate, e))
            })?,
            None => U256::zero(),
        };

        let contract_address = self
            .contract_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| {
                Address::from_str(a).map_err(|e| {
                    ConfigError::ValidationError(format!("{}: invalid contract address: {}", self.identifier, e))
                })
            })
            .transpose()?;

        Ok(TokenInfo {
            identifier: self.identifier.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            token_type: self.token_type,
            decimals: self.decimals,
            rate,
            rate_hint: self.rate_hint.clone(),
            contract_address,
        })
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    60
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swap.fee_bps > BPS_DENOMINATOR {
            return Err(ConfigError::ValidationError(format!(
                "fee_bps must be 0-{}, got {}",
                BPS_DENOMINATOR, self.swap.fee_bps
            )));
        }

        if self.swap.min_investment < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "min_investment cannot be negative, got {}",
                self.swap.min_investment
            )));
        }

        if self.backend.base_url.is_empty() {
            return Err(ConfigError::ValidationError("backend.base_url cannot be empty".to_string()));
        }

        if self.backend.app_id.is_empty() {
            return Err(ConfigError::ValidationError("backend.app_id cannot be empty".to_string()));
        }

        if self.staging.api_url.is_empty() {
            return Err(ConfigError::ValidationError("staging.api_url cannot be empty".to_string()));
        }

        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError("chain.rpc_url cannot be empty".to_string()));
        }

        if let Some(feed) = &self.feed {
            if feed.nav_url.is_empty() {
                return Err(ConfigError::ValidationError("feed.nav_url cannot be empty".to_string()));
            }
            if feed.poll_interval_secs == 0 {
                return Err(ConfigError::ValidationError("feed.poll_interval_secs must be > 0".to_string()));
            }
        }

        let registry = self.token_registry()?;
        if registry.utility_token().is_none() {
            return Err(ConfigError::ValidationError("no utility token configured".to_string()));
        }
        if registry.security_tokens().next().is_none() {
            return Err(ConfigError::ValidationError("no security token configured".to_string()));
        }

        Ok(())
    }

    /// Build the token registry from the `[[tokens]]` entries
    pub fn token_registry(&self) -> Result<TokenRegistry, ConfigError> {
        let tokens = self
            .tokens
            .iter()
            .map(TokenEntry::to_token_info)
            .collect::<Result<Vec<_>, _>>()?;

        TokenRegistry::new(tokens).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
