use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use sg_core::{DomainError, DomainResult, Identity, IdentityRepository, SubjectType};
use sg_shared::SeedIdentity;

use crate::InfrastructureError;

/// Identity repository held in a concurrent map, keyed by subject id
#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    identities: DashMap<String, Identity>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from configured seed identities
    ///
    /// # Arguments
    /// * `seeds` - Identities with plain text passwords
    /// * `bcrypt_cost` - Work factor for hashing the passwords
    ///
    /// # Returns
    /// * `Ok(Self)` - Repository holding every seed
    /// * `Err(InfrastructureError)` - Unknown subject type or hashing failure
    pub fn from_seed(seeds: &[SeedIdentity], bcrypt_cost: u32) -> Result<Self, InfrastructureError> {
        let repo = Self::new();
        for seed in seeds {
            let subject_type: SubjectType = seed.subject_type.parse().map_err(|_| {
                InfrastructureError::Config(format!(
                    "Unknown subject type '{}' for seed identity {}",
                    seed.subject_type, seed.subject_id
                ))
            })?;
            let hash = bcrypt::hash(&seed.password, bcrypt_cost)?;
            repo.insert(
                Identity::new(&seed.subject_id, subject_type, &seed.login, hash, &seed.role)
                    .with_permissions(seed.permissions.iter().cloned()),
            );
        }

        info!(count = seeds.len(), "Seeded identity repository");
        Ok(repo)
    }

    /// Insert or replace an identity
    pub fn insert(&self, identity: Identity) {
        self.identities.insert(identity.subject_id.clone(), identity);
    }

    /// Number of stored identities
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_by_id(&self, subject_id: &str) -> DomainResult<Option<Identity>> {
        Ok(self.identities.get(subject_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Identity>> {
        Ok(self
            .identities
            .iter()
            .find(|entry| entry.login == login)
            .map(|entry| entry.value().clone()))
    }

    async fn update(&self, identity: Identity) -> DomainResult<Identity> {
        match self.identities.get_mut(&identity.subject_id) {
            Some(mut stored) => {
                *stored = identity.clone();
                Ok(identity)
            }
            None => Err(DomainError::NotFound {
                resource: format!("identity {}", identity.subject_id),
            }),
        }
    }
}
