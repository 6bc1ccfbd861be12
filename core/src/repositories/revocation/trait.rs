//! Revocation store trait: the set of tokens rejected before their natural expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;

/// Repository trait for the revocation set
///
/// Entries are keyed by the SHA-256 digest of the token string and live
/// until the token's own expiry. Implementations must be safe under
/// concurrent insert/lookup without lost updates.
///
/// # Security Considerations
/// - Raw tokens are never stored, only their digests
/// - An entry must never be evicted before `expires_at`
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Add a token digest to the revocation set
    ///
    /// # Arguments
    /// * `token_hash` - SHA-256 digest of the token string
    /// * `expires_at` - Natural expiry of the token; the entry is kept at least until then
    ///
    /// # Returns
    /// * `Ok(true)` - The digest was not present and has been inserted
    /// * `Ok(false)` - The digest was already revoked (the call is a no-op)
    /// * `Err(DomainError)` - The store could not be reached
    ///
    /// The check and insert happen atomically, so of several concurrent
    /// callers revoking the same digest exactly one observes `true`.
    async fn revoke(&self, token_hash: &str, expires_at: DateTime<Utc>) -> DomainResult<bool>;

    /// Check whether a token digest has been revoked
    async fn is_revoked(&self, token_hash: &str) -> DomainResult<bool>;

    /// Remove entries whose `expires_at` has passed
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of entries removed
    async fn purge_expired(&self) -> DomainResult<usize>;

    /// Number of entries currently held
    async fn count(&self) -> DomainResult<usize>;
}
