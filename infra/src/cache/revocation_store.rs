//! Redis revocation set

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::debug;

use sg_core::{DomainResult, RevocationStore};

use super::RedisClient;
use crate::InfrastructureError;

/// Revocation set stored as one Redis key per token digest
///
/// Each key carries a TTL equal to the token's remaining lifetime, so Redis
/// evicts entries itself and `purge_expired` has nothing to do.
pub struct RedisRevocationStore {
    redis_client: Arc<RedisClient>,
}

impl RedisRevocationStore {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }

    fn entry_key(&self, token_hash: &str) -> String {
        self.redis_client.key(&format!("revoked:{}", token_hash))
    }
}

/// Seconds for `EX`, rounded up so the key never expires before `expires_at`
pub(crate) fn expiry_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (expires_at - now).num_milliseconds().max(1);
    (remaining_ms + 999) / 1000
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token_hash: &str, expires_at: DateTime<Utc>) -> DomainResult<bool> {
        let ttl = expiry_seconds(expires_at, Utc::now());
        let mut conn = self.redis_client.connection();

        // SET NX answers nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.entry_key(token_hash))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        let newly_revoked = reply.is_some();
        debug!(newly_revoked, ttl, "Revocation recorded in Redis");
        Ok(newly_revoked)
    }

    async fn is_revoked(&self, token_hash: &str) -> DomainResult<bool> {
        let mut conn = self.redis_client.connection();
        let exists: bool = conn
            .exists(self.entry_key(token_hash))
            .await
            .map_err(InfrastructureError::from)?;
        Ok(exists)
    }

    async fn purge_expired(&self) -> DomainResult<usize> {
        Ok(0)
    }

    async fn count(&self) -> DomainResult<usize> {
        let mut conn = self.redis_client.connection();
        let pattern = self.redis_client.key("revoked:*");
        let mut keys = conn
            .scan_match::<_, String>(pattern)
            .await
            .map_err(InfrastructureError::from)?;

        let mut count = 0;
        while keys.next_item().await.is_some() {
            count += 1;
        }
        Ok(count)
    }
}
