//! Business services containing domain logic and use cases.

pub mod auth;
pub mod token;

// Re-export commonly used types
pub use auth::{AccountLockPolicy, AuthService, LoginResult};
pub use token::{
    token_digest, CleanupResult, InvalidReason, IssuanceRateLimiter, RateLimitDecision,
    TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig, Verification,
};
