//! NAV Feed Adapter
//!
//! Polls the NAV endpoint for SPV prices and streams updates to subscribers.

mod poller;

pub use poller::{NavPoller, NavPollerConfig};
