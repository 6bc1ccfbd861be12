//! # SessionGuard Core
//!
//! Domain layer of the token lifecycle subsystem: entities, the error
//! taxonomy, storage ports, and the services that issue, verify, rotate
//! and revoke token pairs.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    Identity, IdentityStatus, IdentitySummary, SubjectType, TokenPair, TokenPayload,
    TokenSubject, TokenType,
};
pub use errors::{AuthError, DomainError, DomainResult, TokenError, ValidationError};
pub use repositories::{IdentityRepository, RevocationStore};
pub use services::{
    token_digest, AccountLockPolicy, AuthService, InvalidReason, IssuanceRateLimiter,
    LoginResult, RateLimitDecision, TokenCleanupConfig, TokenCleanupService, TokenService,
    TokenServiceConfig, Verification,
};
