use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use sg_core::{DomainResult, RevocationStore};

/// Revocation set held in a concurrent map
///
/// Keys are token digests, values the instant after which the entry may be
/// purged.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<String, DateTime<Utc>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token_hash: &str, expires_at: DateTime<Utc>) -> DomainResult<bool> {
        // The shard lock is held across check and insert
        match self.entries.entry(token_hash.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                Ok(true)
            }
        }
    }

    async fn is_revoked(&self, token_hash: &str) -> DomainResult<bool> {
        Ok(self.entries.contains_key(token_hash))
    }

    async fn purge_expired(&self) -> DomainResult<usize> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn count(&self) -> DomainResult<usize> {
        Ok(self.entries.len())
    }
}
