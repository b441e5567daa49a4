//! Fixed-point Unit Conversion
//!
//! Converts between human-entered decimal strings and integer base units
//! at a token's decimal precision. All swap math runs on the integer side.

use ethers::types::U256;
use thiserror::Error;

/// Errors produced while parsing a decimal amount
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,
    #[error("Amount cannot be negative")]
    Negative,
    #[error("Invalid amount: {0}")]
    Invalid(String),
    #[error("Amount has more than {0} decimal places")]
    TooPrecise(u8),
    #[error("Amount is too large")]
    Overflow,
}

/// 10^decimals as a U256; fails above 10^77
pub fn unit_scale(decimals: u8) -> Result<U256, AmountError> {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or(AmountError::Overflow)
}

/// Parse a decimal string (e.g. "100", "0.25", ".5") into base units
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Invalid(amount.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(AmountError::TooPrecise(decimals));
    }

    let digits = format!("{}{:0<width$}", whole, fraction, width = decimals as usize);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits).map_err(|_| AmountError::Overflow)
}

/// Format base units as a decimal string with trailing zeros removed
///
/// Works on the digit string, so any `decimals` is accepted.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
