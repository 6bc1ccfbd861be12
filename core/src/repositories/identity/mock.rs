//! Mock implementation of IdentityRepository for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::identity::Identity;
use crate::errors::{DomainError, DomainResult};

use super::r#trait::IdentityRepository;

/// Mock identity repository for testing
#[derive(Clone, Default)]
pub struct MockIdentityRepository {
    identities: Arc<RwLock<HashMap<String, Identity>>>,
}

impl MockIdentityRepository {
    /// Create a repository holding `identities`
    pub fn with_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let map = identities
            .into_iter()
            .map(|identity| (identity.subject_id.clone(), identity))
            .collect();
        Self {
            identities: Arc::new(RwLock::new(map)),
        }
    }

    /// Apply `f` to a stored identity
    pub async fn modify(&self, subject_id: &str, f: impl FnOnce(&mut Identity)) {
        if let Some(identity) = self.identities.write().await.get_mut(subject_id) {
            f(identity);
        }
    }

    /// Remove an identity entirely
    pub async fn remove(&self, subject_id: &str) {
        self.identities.write().await.remove(subject_id);
    }

    /// Current stored state of an identity
    pub async fn get(&self, subject_id: &str) -> Option<Identity> {
        self.identities.read().await.get(subject_id).cloned()
    }
}

#[async_trait]
impl IdentityRepository for MockIdentityRepository {
    async fn find_by_id(&self, subject_id: &str) -> DomainResult<Option<Identity>> {
        Ok(self.identities.read().await.get(subject_id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities.values().find(|i| i.login == login).cloned())
    }

    async fn update(&self, identity: Identity) -> DomainResult<Identity> {
        let mut identities = self.identities.write().await;
        match identities.get_mut(&identity.subject_id) {
            Some(stored) => {
                *stored = identity.clone();
                Ok(identity)
            }
            None => Err(DomainError::NotFound {
                resource: format!("identity {}", identity.subject_id),
            }),
        }
    }
}
