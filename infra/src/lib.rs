//! # Infrastructure Layer
//!
//! Concrete implementations of the storage ports declared in `sg_core`:
//!
//! - **Memory**: `DashMap`-backed revocation set and identity repository
//!   for single-instance deployments and tests
//! - **Cache**: Redis revocation set (`SET NX EX`) shared across instances
//! - **Services**: sliding window issuance rate limiters
//!
//! ## Features
//!
//! - `redis-cache`: Enable Redis support (default)

use sg_core::DomainError;

/// In-memory stores
pub mod memory;

/// Cache module - Redis client and Redis-backed stores
#[cfg(feature = "redis-cache")]
pub mod cache;

/// Services module - Infrastructure service implementations
pub mod services;

pub use memory::{InMemoryIdentityRepository, InMemoryRevocationStore};
pub use services::auth::InMemoryRateLimiter;

#[cfg(feature = "redis-cache")]
pub use cache::{RedisClient, RedisRevocationStore};
#[cfg(feature = "redis-cache")]
pub use services::auth::RedisRateLimiter;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Password hashing error while seeding identities
    #[error("Hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::internal(err.to_string())
    }
}
