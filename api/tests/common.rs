//! Shared wiring for the HTTP integration tests

use std::sync::Arc;

use actix_web::web;

use sg_api::{AppState, CookieTransport};
use sg_core::{AccountLockPolicy, AuthService, TokenService, TokenServiceConfig};
use sg_infra::{InMemoryIdentityRepository, InMemoryRateLimiter, InMemoryRevocationStore};
use sg_shared::config::rate_limit::TokenRateLimits;
use sg_shared::{CookieConfig, SeedIdentity};

pub type TestState =
    AppState<InMemoryIdentityRepository, InMemoryRevocationStore, InMemoryRateLimiter>;

pub const LOGIN: &str = "ops";
pub const PASSWORD: &str = "s3cret-pass";

pub fn state() -> web::Data<TestState> {
    let seeds = vec![SeedIdentity {
        subject_id: "ops-1".into(),
        subject_type: "admin".into(),
        login: LOGIN.into(),
        password: PASSWORD.into(),
        role: "operator".into(),
        permissions: vec!["sessions:revoke".into()],
    }];

    let identities = Arc::new(InMemoryIdentityRepository::from_seed(&seeds, 4).unwrap());
    let tokens = Arc::new(TokenService::new(
        Arc::new(InMemoryRevocationStore::new()),
        Arc::new(InMemoryRateLimiter::from(&TokenRateLimits::default())),
        TokenServiceConfig::default(),
    ));
    let auth = Arc::new(AuthService::new(identities, tokens, AccountLockPolicy::default()));

    web::Data::new(AppState::new(auth, CookieTransport::new(CookieConfig::default())))
}
