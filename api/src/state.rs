//! Shared application state

use std::sync::Arc;

use sg_core::{AuthService, IdentityRepository, IssuanceRateLimiter, RevocationStore};

use crate::transport::CookieTransport;

/// Application state that holds shared services
pub struct AppState<I, S, L>
where
    I: IdentityRepository,
    S: RevocationStore,
    L: IssuanceRateLimiter,
{
    pub auth_service: Arc<AuthService<I, S, L>>,
    pub transport: CookieTransport,
}

impl<I, S, L> AppState<I, S, L>
where
    I: IdentityRepository,
    S: RevocationStore,
    L: IssuanceRateLimiter,
{
    pub fn new(auth_service: Arc<AuthService<I, S, L>>, transport: CookieTransport) -> Self {
        Self {
            auth_service,
            transport,
        }
    }
}
