pub mod quote_session;
pub mod balances;
pub mod swap_service;
pub mod portfolio;

pub use quote_session::{QuoteSession, QuoteState};
pub use balances::{display_balance, BalanceService, PairBalances, UNKNOWN_BALANCE};
pub use swap_service::{PreparedSwap, SwapError, SwapService};
pub use portfolio::{InvestmentOrder, PortfolioError, PortfolioService};
