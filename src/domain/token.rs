//! Token Registry
//!
//! Static description of the tradeable tokens: the EUT utility token and the
//! SPV security tokens, each with its precision and fixed-point swap rate.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scale of every configured swap rate (rates are 18-decimal fixed point)
pub const RATE_DECIMALS: u8 = 18;

/// Largest precision whose unit (10^decimals) fits in a U256
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    #[error("Duplicate token identifier: {0}")]
    DuplicateToken(String),
    #[error("{identifier}: decimals must be <= {MAX_DECIMALS}, got {decimals}")]
    UnsupportedDecimals { identifier: String, decimals: u8 },
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Platform currency (EUT)
    Utility,
    /// SPV share token
    Security,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Utility => write!(f, "utility"),
            TokenType::Security => write!(f, "security"),
        }
    }
}

/// A registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Registry key, e.g. "EUT" or "SPV-ALPHA"
    pub identifier: String,
    pub symbol: String,
    pub name: String,
    pub token_type: TokenType,
    pub decimals: u8,
    /// Security base units bought by one utility base unit, scaled by 10^18
    pub rate: U256,
    /// Human-readable rate, e.g. "1 EUT = 0.5 SPV-ALPHA"
    pub rate_hint: String,
    /// ERC-20 contract, `None` for the chain's native asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
}

impl TokenInfo {
    pub fn is_utility(&self) -> bool {
        self.token_type == TokenType::Utility
    }

    pub fn is_security(&self) -> bool {
        self.token_type == TokenType::Security
    }
}

/// Identifier-unique, insertion-ordered token collection
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for token in tokens {
            registry.insert(token)?;
        }
        Ok(registry)
    }

    /// Add a token, rejecting duplicate identifiers and unrepresentable precision
    pub fn insert(&mut self, token: TokenInfo) -> Result<(), RegistryError> {
        if token.decimals > MAX_DECIMALS {
            return Err(RegistryError::UnsupportedDecimals {
                identifier: token.identifier,
                decimals: token.decimals,
            });
        }
        if self.tokens.iter().any(|t| t.identifier == token.identifier) {
            return Err(RegistryError::DuplicateToken(token.identifier));
        }
        self.tokens.push(token);
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Result<&TokenInfo, RegistryError> {
        self.tokens
            .iter()
            .find(|t| t.identifier == identifier)
            .ok_or_else(|| RegistryError::UnknownToken(identifier.to_string()))
    }

    /// The first configured utility token
    pub fn utility_token(&self) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| t.is_utility())
    }

    pub fn security_tokens(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.iter().filter(|t| t.is_security())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
