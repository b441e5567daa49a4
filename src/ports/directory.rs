//! Token lookup port
//!
//! Quote computation resolves tokens through this trait so the registry can
//! be backed by something slower than the static config list.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{RegistryError, TokenInfo, TokenRegistry};

#[async_trait]
pub trait TokenDirectory: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<TokenInfo, RegistryError>;
}

#[async_trait]
impl TokenDirectory for TokenRegistry {
    async fn resolve(&self, identifier: &str) -> Result<TokenInfo, RegistryError> {
        self.get(identifier).cloned()
    }
}

#[async_trait]
impl<T: TokenDirectory + ?Sized> TokenDirectory for Arc<T> {
    async fn resolve(&self, identifier: &str) -> Result<TokenInfo, RegistryError> {
        (**self).resolve(identifier).await
    }
}
