//! Swap Quote Calculator
//!
//! Converts between the EUT utility token and SPV security tokens using
//! 256-bit fixed-point integer math. A fee in basis points is always taken
//! on the utility-token leg of the swap:
//!
//! - Utility -> Security: fee is taken from the input, the net amount is
//!   multiplied by the security token's rate.
//! - Security -> Utility: the input is divided by the security token's rate,
//!   and the fee is taken from the resulting utility amount.
//!
//! Zero-rate handling is asymmetric: a zero rate on the output leg quotes
//! zero, a zero rate on the input leg (where it is the divisor) is an error.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::token::{TokenInfo, RATE_DECIMALS};
use super::units::{format_units, parse_units, unit_scale};

/// Basis points in 100%
pub const BPS_DENOMINATOR: u16 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Swaps only supported between utility and security tokens")]
    UnsupportedPair,

    #[error("Swap rate is not configured for {0}")]
    RateNotConfigured(String),

    #[error("Fee of {0} bps exceeds {BPS_DENOMINATOR} bps")]
    InvalidFee(u16),

    #[error("Swap amount overflows 256-bit arithmetic")]
    Overflow,
}

/// Direction of a supported swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    UtilityToSecurity,
    SecurityToUtility,
}

impl SwapDirection {
    /// Classify a token pair, rejecting anything but utility <-> security
    pub fn between(from: &TokenInfo, to: &TokenInfo) -> Result<Self, QuoteError> {
        if from.identifier == to.identifier {
            return Err(QuoteError::UnsupportedPair);
        }

        match (from.is_utility(), to.is_security(), from.is_security(), to.is_utility()) {
            (true, true, _, _) => Ok(SwapDirection::UtilityToSecurity),
            (_, _, true, true) => Ok(SwapDirection::SecurityToUtility),
            _ => Err(QuoteError::UnsupportedPair),
        }
    }
}

/// Integer result of a quote, all amounts in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteUnits {
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Always denominated in utility-token base units
    pub fee: U256,
}

/// A priced swap ready for display or staging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub direction: SwapDirection,
    pub from_token: String,
    pub to_token: String,
    /// Input amount at the source token's precision
    pub amount_in: String,
    /// Output amount at the destination token's precision
    pub amount_out: String,
    /// Fee at the utility token's precision
    pub fee: String,
    /// Display hint of the security token's rate
    pub rate: String,
    #[serde(skip)]
    pub units: Option<QuoteUnits>,
}

/// Stateless quote calculator configured with the platform fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuoter {
    fee_bps: u16,
}

impl SwapQuoter {
    pub fn new(fee_bps: u16) -> Result<Self, QuoteError> {
        if fee_bps > BPS_DENOMINATOR {
            return Err(QuoteError::InvalidFee(fee_bps));
        }
        Ok(Self { fee_bps })
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    /// Quote a human-entered amount.
    ///
    /// Returns `Ok(None)` when the amount is empty, unparseable or not
    /// positive: that is "nothing entered yet", not an error.
    pub fn quote(
        &self,
        from: &TokenInfo,
        to: &TokenInfo,
        amount: &str,
    ) -> Result<Option<SwapQuote>, QuoteError> {
        let amount_units = match parse_units(amount, from.decimals) {
            Ok(units) if !units.is_zero() => units,
            _ => return Ok(None),
        };

        let units = self.quote_units(from, to, amount_units)?;

        let (fee_decimals, rate) = match units.direction {
            SwapDirection::UtilityToSecurity => (from.decimals, &to.rate_hint),
            SwapDirection::SecurityToUtility => (to.decimals, &from.rate_hint),
        };

        Ok(Some(SwapQuote {
            direction: units.direction,
            from_token: from.identifier.clone(),
            to_token: to.identifier.clone(),
            amount_in: format_units(units.amount_in, from.decimals),
            amount_out: format_units(units.amount_out, to.decimals),
            fee: format_units(units.fee, fee_decimals),
            rate: rate.clone(),
            units: Some(units),
        }))
    }

    /// Quote an amount already expressed in the source token's base units
    pub fn quote_units(
        &self,
        from: &TokenInfo,
        to: &TokenInfo,
        amount_in: U256,
    ) -> Result<QuoteUnits, QuoteError> {
        let direction = SwapDirection::between(from, to)?;
        let rate_scale = unit_scale(RATE_DECIMALS).map_err(|_| QuoteError::Overflow)?;

        let (amount_out, fee) = match direction {
            SwapDirection::UtilityToSecurity => {
                let fee = self.fee_on(amount_in)?;
                let net = amount_in - fee;
                // A misconfigured output rate quotes zero rather than failing
                let out = if to.rate.is_zero() {
                    U256::zero()
                } else {
                    net.checked_mul(to.rate).ok_or(QuoteError::Overflow)? / rate_scale
                };
                (out, fee)
            }
            SwapDirection::SecurityToUtility => {
                if from.rate.is_zero() {
                    return Err(QuoteError::RateNotConfigured(from.identifier.clone()));
                }
                let gross = amount_in.checked_mul(rate_scale).ok_or(QuoteError::Overflow)? / from.rate;
                let fee = self.fee_on(gross)?;
                (gross - fee, fee)
            }
        };

        Ok(QuoteUnits {
            direction,
            amount_in,
            amount_out,
            fee,
        })
    }

    fn fee_on(&self, utility_units: U256) -> Result<U256, QuoteError> {
        utility_units
            .checked_mul(U256::from(self.fee_bps))
            .map(|scaled| scaled / U256::from(BPS_DENOMINATOR))
            .ok_or(QuoteError::Overflow)
    }
}
