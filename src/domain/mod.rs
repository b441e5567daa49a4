//! Domain Layer - Core swap and portfolio logic for Euphena
//!
//! Pure types and calculations with no I/O. All external interactions
//! happen through the ports layer.
//!
//! - `token`: utility/security token registry
//! - `units`: decimal string <-> integer base unit conversion
//! - `quote`: fixed-point swap quote calculator
//! - `validation`: form checks run before any network call
//! - `portfolio`: holdings totals recomputed from fetched records

pub mod token;
pub mod units;
pub mod quote;
pub mod validation;
pub mod portfolio;

pub use token::{TokenInfo, TokenRegistry, TokenType, RegistryError, MAX_DECIMALS, RATE_DECIMALS};
pub use units::{format_units, parse_units, unit_scale, AmountError};
pub use quote::{SwapDirection, SwapQuote, SwapQuoter, QuoteUnits, QuoteError, BPS_DENOMINATOR};
pub use validation::{validate_swap_form, validate_investment, require_field, SwapForm, ValidatedSwap, ValidationError};
pub use portfolio::{Holding, Investment, PortfolioSummary, UserProfile};
