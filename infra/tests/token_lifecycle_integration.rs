//! Token lifecycle against the in-memory infrastructure
//!
//! Wires the core services to the concrete stores the server uses by
//! default.

use std::sync::Arc;

use chrono::{Duration, Utc};

use sg_core::{
    AccountLockPolicy, AuthService, DomainError, InvalidReason, TokenCleanupConfig,
    TokenCleanupService, TokenError, TokenService, TokenServiceConfig, Verification,
};
use sg_infra::{InMemoryIdentityRepository, InMemoryRateLimiter, InMemoryRevocationStore};
use sg_shared::config::rate_limit::TokenRateLimits;
use sg_shared::SeedIdentity;

type Auth = AuthService<InMemoryIdentityRepository, InMemoryRevocationStore, InMemoryRateLimiter>;

fn seeds() -> Vec<SeedIdentity> {
    vec![SeedIdentity {
        subject_id: "ops-1".into(),
        subject_type: "admin".into(),
        login: "ops".into(),
        password: "s3cret-pass".into(),
        role: "operator".into(),
        permissions: vec!["sessions:revoke".into()],
    }]
}

fn wire() -> (Auth, Arc<InMemoryRevocationStore>) {
    wire_with(TokenServiceConfig::default())
}

fn wire_with(config: TokenServiceConfig) -> (Auth, Arc<InMemoryRevocationStore>) {
    let identities = Arc::new(InMemoryIdentityRepository::from_seed(&seeds(), 4).unwrap());
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let limiter = Arc::new(InMemoryRateLimiter::from(&TokenRateLimits::default()));
    let tokens = Arc::new(TokenService::new(
        revocations.clone(),
        limiter,
        config,
    ));
    (
        AuthService::new(identities, tokens, AccountLockPolicy::default()),
        revocations,
    )
}

#[tokio::test]
async fn test_login_rotate_logout() {
    let (auth, revocations) = wire();

    let login = auth.login("ops", "s3cret-pass", None).await.unwrap();
    let rotated = auth.refresh(&login.tokens.refresh_token).await.unwrap();
    assert_eq!(rotated.session_id, login.tokens.session_id);

    // Replaying the consumed refresh token fails
    let replay = auth.refresh(&login.tokens.refresh_token).await;
    assert!(matches!(replay, Err(DomainError::Token(TokenError::InvalidatedToken))));

    auth.logout(Some(&rotated.refresh_token), Some(&rotated.access_token))
        .await
        .unwrap();
    assert_eq!(
        auth.tokens().verify_access(&rotated.access_token).await.unwrap(),
        Verification::Invalid(InvalidReason::Invalidated)
    );

    // Nothing is expired yet, so a sweep keeps every entry
    let cleanup = TokenCleanupService::new(revocations, TokenCleanupConfig::default());
    let result = cleanup.run_cleanup().await.unwrap();
    assert_eq!(result.revocations_purged, 0);
    assert_eq!(result.revocations_remaining, 3);
}

#[tokio::test]
async fn test_sixth_login_in_window_is_rate_limited() {
    let (auth, _) = wire();

    for _ in 0..5 {
        auth.login("ops", "s3cret-pass", None).await.unwrap();
    }

    let result = auth.login("ops", "s3cret-pass", None).await;
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::RateLimited { .. }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_rotation_of_one_token() {
    let (auth, _) = wire();
    let auth = Arc::new(auth);
    let login = auth.login("ops", "s3cret-pass", None).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let auth = auth.clone();
            let token = login.tokens.refresh_token.clone();
            tokio::spawn(async move { auth.refresh(&token).await.is_ok() })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_replay_in_final_second_survives_cleanup() {
    let (auth, revocations) = wire_with(TokenServiceConfig {
        access_ttl: Duration::seconds(1),
        refresh_ttl: Duration::seconds(2),
        ..TokenServiceConfig::default()
    });
    let login = auth.login("ops", "s3cret-pass", None).await.unwrap();
    auth.refresh(&login.tokens.refresh_token).await.unwrap();

    // Inside [exp, exp + 1s) the signature check still accepts the token
    let exp = login.tokens.refresh_expires_at;
    let wait = (exp + Duration::milliseconds(200) - Utc::now())
        .to_std()
        .unwrap_or_default();
    tokio::time::sleep(wait).await;

    let cleanup = TokenCleanupService::new(revocations, TokenCleanupConfig::default());
    let result = cleanup.run_cleanup().await.unwrap();
    assert_eq!(result.revocations_purged, 0);

    let replay = auth.refresh(&login.tokens.refresh_token).await;
    assert!(matches!(replay, Err(DomainError::Token(TokenError::InvalidatedToken))));
}
