//! Mock implementation of RevocationStore for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::DomainResult;

use super::r#trait::RevocationStore;

/// Mock revocation store for testing
#[derive(Clone, Default)]
pub struct MockRevocationStore {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl MockRevocationStore {
    /// Create a new mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiry recorded for `token_hash`, if any
    pub async fn expiry_of(&self, token_hash: &str) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(token_hash).copied()
    }
}

#[async_trait]
impl RevocationStore for MockRevocationStore {
    async fn revoke(&self, token_hash: &str, expires_at: DateTime<Utc>) -> DomainResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(token_hash) {
            return Ok(false);
        }
        entries.insert(token_hash.to_string(), expires_at);
        Ok(true)
    }

    async fn is_revoked(&self, token_hash: &str) -> DomainResult<bool> {
        Ok(self.entries.read().await.contains_key(token_hash))
    }

    async fn purge_expired(&self) -> DomainResult<usize> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok(before - entries.len())
    }

    async fn count(&self) -> DomainResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
