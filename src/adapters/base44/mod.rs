//! base44 Adapter
//!
//! Implementation of the BackendPort for the hosted base44 backend.
//! Handles auth, entity CRUD and file upload over its REST API.

mod client;

pub use client::{Base44Client, Base44Config};
