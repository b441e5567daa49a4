//! Hosted backend port
//!
//! The `base44` backend-as-a-service owns every entity schema. This crate
//! only passes loosely typed JSON records through the calls below, so a
//! fake can stand in for the real client in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Backend request failed: {0}")]
    Http(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("Unexpected backend payload: {0}")]
    Decode(String),
}

/// Entities stored in the hosted backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    #[serde(rename = "SPV")]
    Spv,
    Investment,
    Transaction,
    Message,
    BotConfig,
    BotTrade,
    BotPerformance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Spv,
        EntityKind::Investment,
        EntityKind::Transaction,
        EntityKind::Message,
        EntityKind::BotConfig,
        EntityKind::BotTrade,
        EntityKind::BotPerformance,
    ];

    /// Name used in backend URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Spv => "SPV",
            EntityKind::Investment => "Investment",
            EntityKind::Transaction => "Transaction",
            EntityKind::Message => "Message",
            EntityKind::BotConfig => "BotConfig",
            EntityKind::BotTrade => "BotTrade",
            EntityKind::BotPerformance => "BotPerformance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `integrations.Core.UploadFile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
}

/// Backend calls used by the services. Sort keys follow the backend
/// convention: `"field"` ascending, `"-field"` descending.
#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Current user record
    async fn me(&self) -> Result<Value, BackendError>;

    /// Patch the current user record
    async fn update_me(&self, patch: Value) -> Result<Value, BackendError>;

    /// Where to send an unauthenticated user
    fn login_url(&self, return_to: Option<&str>) -> String;

    async fn logout(&self) -> Result<(), BackendError>;

    async fn list(&self, entity: EntityKind, sort: Option<&str>) -> Result<Vec<Value>, BackendError>;

    async fn filter(
        &self,
        entity: EntityKind,
        query: Value,
        sort: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, BackendError>;

    async fn create(&self, entity: EntityKind, record: Value) -> Result<Value, BackendError>;

    async fn update(&self, entity: EntityKind, id: &str, patch: Value) -> Result<Value, BackendError>;

    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile, BackendError>;
}
