//! Ports Layer - Trait definitions for external dependencies
//!
//! Every external collaborator is injected through one of these traits:
//! - Hosted backend (auth, entities, file upload)
//! - Swap staging API
//! - On-chain balance reads
//! - Token lookup
//! - SPV NAV feed

pub mod backend;
pub mod staging;
pub mod balances;
pub mod directory;
pub mod price_feed;
pub mod mocks;

pub use backend::{BackendError, BackendPort, EntityKind, UploadedFile};
pub use staging::{StageSwapRequest, StagedQuote, StagedSwap, StagingError, StagingPort, TransactionPlan};
pub use balances::{BalanceError, BalancePort};
pub use directory::TokenDirectory;
pub use price_feed::{FeedError, NavUpdate, PriceFeedPort};
