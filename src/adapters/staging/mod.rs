//! Swap Staging Adapter
//!
//! HTTP implementation of the StagingPort.

mod client;

pub use client::{HttpStagingClient, StagingConfig};
