//! Form Validation
//!
//! Checks user input before any network call is made. A failed check never
//! mutates state; the error text is what the user sees.

use ethers::types::U256;
use rust_decimal::Decimal;
use thiserror::Error;

use super::token::{TokenInfo, TokenRegistry};
use super::units::{format_units, parse_units, AmountError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select both tokens")]
    MissingToken,

    #[error("Please select two different tokens")]
    SameToken,

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Please enter an amount")]
    MissingAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: String, requested: String },

    #[error("Minimum investment is {minimum}, got {amount}")]
    BelowMinimum { minimum: Decimal, amount: Decimal },

    #[error("{0} is required")]
    MissingField(String),
}

/// Raw swap form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapForm {
    pub from: String,
    pub to: String,
    pub amount: String,
}

impl SwapForm {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount: amount.into(),
        }
    }
}

/// A swap form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSwap<'a> {
    pub from: &'a TokenInfo,
    pub to: &'a TokenInfo,
    pub amount_units: U256,
}

/// Validate a swap form against the registry and an optional known balance
/// of the source token (in base units).
pub fn validate_swap_form<'a>(
    form: &SwapForm,
    registry: &'a TokenRegistry,
    available: Option<U256>,
) -> Result<ValidatedSwap<'a>, ValidationError> {
    let from_id = form.from.trim();
    let to_id = form.to.trim();

    if from_id.is_empty() || to_id.is_empty() {
        return Err(ValidationError::MissingToken);
    }
    if from_id == to_id {
        return Err(ValidationError::SameToken);
    }

    let from = registry
        .get(from_id)
        .map_err(|_| ValidationError::UnknownToken(from_id.to_string()))?;
    let to = registry
        .get(to_id)
        .map_err(|_| ValidationError::UnknownToken(to_id.to_string()))?;

    let amount_units = match parse_units(&form.amount, from.decimals) {
        Ok(units) if units.is_zero() => {
            return Err(ValidationError::InvalidAmount("amount must be greater than zero".into()))
        }
        Ok(units) => units,
        Err(AmountError::Empty) => return Err(ValidationError::MissingAmount),
        Err(e) => return Err(ValidationError::InvalidAmount(e.to_string())),
    };

    if let Some(available) = available {
        if amount_units > available {
            return Err(ValidationError::InsufficientBalance {
                available: format_units(available, from.decimals),
                requested: format_units(amount_units, from.decimals),
            });
        }
    }

    Ok(ValidatedSwap { from, to, amount_units })
}

/// Reject investments under the SPV's minimum ticket
pub fn validate_investment(amount: Decimal, minimum: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }
    if amount < minimum {
        return Err(ValidationError::BelowMinimum { minimum, amount });
    }
    Ok(())
}

/// Reject a blank required form field
pub fn require_field<'v>(name: &str, value: &'v str) -> Result<&'v str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(name.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::TokenType;
    use crate::domain::units::unit_scale;
    use rust_decimal_macros::dec;

    fn registry() -> TokenRegistry {
        let token = |id: &str, token_type| TokenInfo {
            identifier: id.to_string(),
            symbol: id.to_string(),
            name: id.to_string(),
            token_type,
            decimals: 18,
            rate: unit_scale(18).unwrap(),
            rate_hint: String::new(),
            contract_address: None,
        };
        TokenRegistry::new(vec![
            token("EUT", TokenType::Utility),
            token("SPV-A", TokenType::Security),
        ])
        .unwrap()
    }

    #[test]
    fn test_valid_form() {
        let registry = registry();
        let form = SwapForm::new("EUT", "SPV-A", "12.5");
        let validated = validate_swap_form(&form, &registry, None).unwrap();

        assert_eq!(validated.from.identifier, "EUT");
        assert_eq!(validated.to.identifier, "SPV-A");
        assert_eq!(validated.amount_units, unit_scale(17).unwrap() * U256::from(125u64));
    }

    #[test]
    fn test_same_token_rejected_before_lookup() {
        // Unknown identifiers would fail later; the same-token check comes first
        let form = SwapForm::new("XYZ", "XYZ", "1");
        assert_eq!(
            validate_swap_form(&form, &registry(), None),
            Err(ValidationError::SameToken)
        );
    }

    #[test]
    fn test_missing_inputs() {
        let registry = registry();
        assert_eq!(
            validate_swap_form(&SwapForm::new("", "SPV-A", "1"), &registry, None),
            Err(ValidationError::MissingToken)
        );
        assert_eq!(
            validate_swap_form(&SwapForm::new("EUT", "SPV-A", " "), &registry, None),
            Err(ValidationError::MissingAmount)
        );
        assert!(matches!(
            validate_swap_form(&SwapForm::new("EUT", "SPV-A", "0"), &registry, None),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert_eq!(
            validate_swap_form(&SwapForm::new("EUT", "SPV-Z", "1"), &registry, None),
            Err(ValidationError::UnknownToken("SPV-Z".to_string()))
        );
    }

    #[test]
    fn test_insufficient_balance() {
        let registry = registry();
        let form = SwapForm::new("EUT", "SPV-A", "10");
        let result = validate_swap_form(&form, &registry, Some(unit_scale(18).unwrap() * U256::from(5u64)));

        assert_eq!(
            result,
            Err(ValidationError::InsufficientBalance {
                available: "5".to_string(),
                requested: "10".to_string(),
            })
        );
    }

    #[test]
    fn test_investment_minimum() {
        assert!(validate_investment(dec!(1000), dec!(500)).is_ok());
        assert!(validate_investment(dec!(500), dec!(500)).is_ok());
        assert_eq!(
            validate_investment(dec!(250), dec!(500)),
            Err(ValidationError::BelowMinimum { minimum: dec!(500), amount: dec!(250) })
        );
        assert!(matches!(
            validate_investment(dec!(0), dec!(0)),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("SPV name", "  Alpha  "), Ok("Alpha"));
        assert_eq!(
            require_field("SPV name", "   "),
            Err(ValidationError::MissingField("SPV name".to_string()))
        );
    }
}
