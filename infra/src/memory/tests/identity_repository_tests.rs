//! Unit tests for the in-memory identity repository

use sg_core::{DomainError, IdentityRepository, IdentityStatus, SubjectType};
use sg_shared::SeedIdentity;

use crate::memory::InMemoryIdentityRepository;
use crate::InfrastructureError;

fn seed(subject_type: &str) -> SeedIdentity {
    SeedIdentity {
        subject_id: "admin-1".into(),
        subject_type: subject_type.into(),
        login: "root".into(),
        password: "hunter2".into(),
        role: "superadmin".into(),
        permissions: vec!["*".into()],
    }
}

#[tokio::test]
async fn test_seeded_identity_has_bcrypt_hash() {
    let repo = InMemoryIdentityRepository::from_seed(&[seed("admin")], 4).unwrap();

    let identity = repo.find_by_login("root").await.unwrap().unwrap();
    assert_eq!(identity.subject_id, "admin-1");
    assert_eq!(identity.subject_type, SubjectType::Admin);
    assert_eq!(identity.status, IdentityStatus::Active);
    assert!(bcrypt::verify("hunter2", &identity.password_hash).unwrap());
}

#[test]
fn test_seed_with_unknown_type_fails() {
    let result = InMemoryIdentityRepository::from_seed(&[seed("robot")], 4);
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[tokio::test]
async fn test_update_replaces_stored_identity() {
    let repo = InMemoryIdentityRepository::from_seed(&[seed("admin")], 4).unwrap();
    let mut identity = repo.find_by_id("admin-1").await.unwrap().unwrap();
    identity.token_version = 3;

    repo.update(identity).await.unwrap();

    assert_eq!(repo.find_by_id("admin-1").await.unwrap().unwrap().token_version, 3);
}

#[tokio::test]
async fn test_update_unknown_identity_is_not_found() {
    let repo = InMemoryIdentityRepository::new();
    let identity = sg_core::Identity::new("ghost", SubjectType::User, "ghost", "", "member");

    assert!(matches!(
        repo.update(identity).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(repo.is_empty());
}
