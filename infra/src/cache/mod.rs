//! Cache module for Redis-backed stores
//!
//! Used when several server instances must agree on which tokens are
//! revoked and how many pairs an identity was issued.

pub mod redis_client;
pub mod revocation_store;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use revocation_store::RedisRevocationStore;
