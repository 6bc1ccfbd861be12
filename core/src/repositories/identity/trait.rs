//! Identity repository trait: read access to the principals tokens are issued to.

use async_trait::async_trait;

use crate::domain::entities::identity::Identity;
use crate::errors::DomainResult;

/// Repository trait for Identity lookups
///
/// Identity CRUD lives outside the token subsystem; this is the narrow
/// contract rotation and login depend on.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Find an identity by its ID
    ///
    /// # Arguments
    /// * `subject_id` - The identity ID carried in the `sub` claim
    ///
    /// # Returns
    /// * `Ok(Some(Identity))` - Identity found
    /// * `Ok(None)` - No identity with the given ID
    /// * `Err(DomainError)` - Lookup failed
    async fn find_by_id(&self, subject_id: &str) -> DomainResult<Option<Identity>>;

    /// Find an identity by login name
    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Identity>>;

    /// Persist login bookkeeping (failed attempts, lock, last login)
    ///
    /// # Returns
    /// * `Ok(Identity)` - The stored identity
    /// * `Err(DomainError)` - The identity does not exist or the write failed
    async fn update(&self, identity: Identity) -> DomainResult<Identity>;
}
