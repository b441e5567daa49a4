//! Swap Preparation
//!
//! Validates the swap form, prices it, and asks the staging API for a
//! transaction plan the user's wallet can sign. Validation failures return
//! before any network call; every error's `Display` is the message shown
//! to the user.

use std::sync::Arc;

use ethers::types::U256;
use thiserror::Error;

use crate::domain::{
    require_field, validate_swap_form, QuoteError, SwapForm, SwapQuote, SwapQuoter, TokenRegistry,
    ValidationError,
};
use crate::ports::{StageSwapRequest, StagedSwap, StagingError, StagingPort};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Quote(#[from] QuoteError),

    #[error("Swap failed: {0}")]
    Staging(#[from] StagingError),
}

/// A quoted swap with its staged transaction plan
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSwap {
    pub quote: SwapQuote,
    pub staged: StagedSwap,
}

pub struct SwapService {
    registry: Arc<TokenRegistry>,
    quoter: SwapQuoter,
    staging: Arc<dyn StagingPort>,
}

impl SwapService {
    pub fn new(registry: Arc<TokenRegistry>, quoter: SwapQuoter, staging: Arc<dyn StagingPort>) -> Self {
        Self {
            registry,
            quoter,
            staging,
        }
    }

    /// Validate, quote and stage a swap.
    ///
    /// `available` is the caller's last known balance of the source token in
    /// base units, if any.
    pub async fn prepare_swap(
        &self,
        form: &SwapForm,
        wallet_address: &str,
        available: Option<U256>,
    ) -> Result<PreparedSwap, SwapError> {
        let wallet = require_field("Wallet address", wallet_address)?;
        let validated = validate_swap_form(form, &self.registry, available)?;

        let quote = self
            .quoter
            .quote(validated.from, validated.to, &form.amount)?
            .ok_or_else(|| ValidationError::InvalidAmount(form.amount.clone()))?;

        let request = StageSwapRequest {
            from_token: validated.from.identifier.clone(),
            to_token: validated.to.identifier.clone(),
            amount: quote.amount_in.clone(),
            wallet_address: wallet.to_string(),
        };

        let staged = self.staging.stage_swap(request).await.map_err(|e| {
            tracing::error!("Staging {} -> {} failed: {}", quote.from_token, quote.to_token, e);
            e
        })?;

        if staged.quote.amount_out != quote.amount_out {
            tracing::warn!(
                "Staged output {} differs from local quote {}",
                staged.quote.amount_out,
                quote.amount_out
            );
        }

        tracing::info!(
            "Prepared swap {} {} -> {} {} via {}::{}",
            quote.amount_in,
            quote.from_token,
            quote.amount_out,
            quote.to_token,
            staged.transaction.contract_address,
            staged.transaction.method
        );

        Ok(PreparedSwap { quote, staged })
    }
}
